use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::ReportCatalog;
use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    ANALYTICS_REPORTING_ENDPOINT, APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_CLICKHOUSE_DATABASE,
    DEFAULT_CLICKHOUSE_URL, DEFAULT_PAGE_DELAY_MS, DEFAULT_PAGE_SIZE, DEFAULT_WRITE_TIMEOUT_SECS,
    ENV_DAY_OF_DATA_CAPTURE, ENV_KEY_FILE_LOCATION, ENV_VIEW_ID, MAX_PAGE_SIZE,
};

// =============================================================================
// Store Backend Enum
// =============================================================================

/// Entity store for report rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Clickhouse,
    /// Dry runs: rows are kept in process and dropped on exit
    Memory,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Clickhouse => "clickhouse",
            StoreBackend::Memory => "memory",
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// File Config (JSON)
// =============================================================================

/// Reporting API section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AnalyticsFileConfig {
    pub view_id: Option<String>,
    /// Service-account key file; `~` is expanded
    pub key_file: Option<String>,
    /// Override of the batch report endpoint
    pub endpoint: Option<String>,
    pub page_size: Option<u32>,
    pub page_delay_ms: Option<u64>,
    pub max_empty_pages: Option<u32>,
}

/// ClickHouse section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ClickhouseFileConfig {
    pub url: Option<String>,
    /// Database name (default: "default")
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Enable LZ4 compression (default: true)
    pub compression: Option<bool>,
    /// Create report tables when missing (default: true)
    pub ensure_schema: Option<bool>,
}

/// Store section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StoreFileConfig {
    pub backend: Option<StoreBackend>,
    pub write_timeout_secs: Option<u64>,
    pub clickhouse: Option<ClickhouseFileConfig>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub capture_day: Option<String>,
    pub analytics: Option<AnalyticsFileConfig>,
    pub store: Option<StoreFileConfig>,
    /// Replaces the built-in report catalog
    pub reports: Option<ReportCatalog>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str = map.keys().map(String::as_str).collect::<Vec<_>>().join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if other.capture_day.is_some() {
            self.capture_day = other.capture_day;
        }

        if let Some(analytics) = other.analytics {
            let current = self
                .analytics
                .get_or_insert_with(AnalyticsFileConfig::default);
            merge_opt(&mut current.view_id, analytics.view_id);
            merge_opt(&mut current.key_file, analytics.key_file);
            merge_opt(&mut current.endpoint, analytics.endpoint);
            merge_opt(&mut current.page_size, analytics.page_size);
            merge_opt(&mut current.page_delay_ms, analytics.page_delay_ms);
            merge_opt(&mut current.max_empty_pages, analytics.max_empty_pages);
        }

        if let Some(store) = other.store {
            let current = self.store.get_or_insert_with(StoreFileConfig::default);
            merge_opt(&mut current.backend, store.backend);
            merge_opt(&mut current.write_timeout_secs, store.write_timeout_secs);
            if let Some(clickhouse) = store.clickhouse {
                let current_ch = current
                    .clickhouse
                    .get_or_insert_with(ClickhouseFileConfig::default);
                merge_opt(&mut current_ch.url, clickhouse.url);
                merge_opt(&mut current_ch.database, clickhouse.database);
                merge_opt(&mut current_ch.user, clickhouse.user);
                merge_opt(&mut current_ch.password, clickhouse.password);
                merge_opt(&mut current_ch.compression, clickhouse.compression);
                merge_opt(&mut current_ch.ensure_schema, clickhouse.ensure_schema);
            }
        }

        // The catalog is replaced whole, never merged entry by entry
        if other.reports.is_some() {
            self.reports = other.reports;
        }
    }
}

fn merge_opt<T>(current: &mut Option<T>, other: Option<T>) {
    if other.is_some() {
        *current = other;
    }
}

// =============================================================================
// Runtime Config
// =============================================================================

/// Reporting API configuration (final/runtime)
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    pub view_id: String,
    pub key_file: PathBuf,
    pub endpoint: String,
    pub page_size: u32,
    pub page_delay: Duration,
    pub max_empty_pages: Option<u32>,
}

/// ClickHouse configuration (final/runtime)
#[derive(Debug, Clone)]
pub struct ClickhouseConfig {
    /// ClickHouse HTTP URL
    pub url: String,
    pub database: String,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Enable LZ4 compression for requests/responses
    pub compression: bool,
    /// Run `CREATE TABLE IF NOT EXISTS` while preparing statements
    pub ensure_schema: bool,
}

/// Store configuration (final/runtime)
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Set whenever the backend is ClickHouse
    pub clickhouse: Option<ClickhouseConfig>,
    pub write_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub capture_day: NaiveDate,
    pub analytics: AnalyticsConfig,
    pub store: StoreConfig,
    pub reports: ReportCatalog,
    /// Report names to run; empty runs the whole catalog
    pub only_reports: Vec<String>,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.ga-connector/ga-connector.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Load from profile dir - skip if not exists
        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. Load from CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        Self::from_layers(cli, file_config)
    }

    /// Layer defaults -> file config -> CLI/env overrides, then validate
    fn from_layers(cli: &CliConfig, file_config: FileConfig) -> Result<Self> {
        let file_analytics = file_config.analytics.unwrap_or_default();
        let file_store = file_config.store.unwrap_or_default();

        let capture_day_raw = cli
            .capture_day
            .clone()
            .or(file_config.capture_day)
            .with_context(|| {
                format!(
                    "Capture day is required (--capture-day or {})",
                    ENV_DAY_OF_DATA_CAPTURE
                )
            })?;
        let capture_day = NaiveDate::parse_from_str(capture_day_raw.trim(), "%Y-%m-%d")
            .with_context(|| {
                format!(
                    "Invalid capture day '{}': expected YYYY-MM-DD",
                    capture_day_raw
                )
            })?;

        let view_id = cli
            .view_id
            .clone()
            .or(file_analytics.view_id)
            .with_context(|| format!("View id is required (--view-id or {})", ENV_VIEW_ID))?;

        let key_file = cli
            .key_file
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned())
            .or(file_analytics.key_file)
            .map(|p| expand_path(&p))
            .with_context(|| {
                format!(
                    "Key file is required (--key-file or {})",
                    ENV_KEY_FILE_LOCATION
                )
            })?;

        let analytics = AnalyticsConfig {
            view_id,
            key_file,
            endpoint: file_analytics
                .endpoint
                .unwrap_or_else(|| ANALYTICS_REPORTING_ENDPOINT.to_string()),
            page_size: file_analytics.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            page_delay: Duration::from_millis(
                cli.page_delay_ms
                    .or(file_analytics.page_delay_ms)
                    .unwrap_or(DEFAULT_PAGE_DELAY_MS),
            ),
            max_empty_pages: cli.max_empty_pages.or(file_analytics.max_empty_pages),
        };

        let backend = cli.store.or(file_store.backend).unwrap_or_default();
        let clickhouse = match backend {
            StoreBackend::Clickhouse => {
                let file_ch = file_store.clickhouse.unwrap_or_default();
                Some(ClickhouseConfig {
                    url: cli
                        .clickhouse_url
                        .clone()
                        .or(file_ch.url)
                        .unwrap_or_else(|| DEFAULT_CLICKHOUSE_URL.to_string()),
                    database: cli
                        .clickhouse_database
                        .clone()
                        .or(file_ch.database)
                        .unwrap_or_else(|| DEFAULT_CLICKHOUSE_DATABASE.to_string()),
                    user: cli.clickhouse_user.clone().or(file_ch.user),
                    password: cli.clickhouse_password.clone().or(file_ch.password),
                    compression: file_ch.compression.unwrap_or(true),
                    ensure_schema: file_ch.ensure_schema.unwrap_or(true),
                })
            }
            StoreBackend::Memory => None,
        };

        let store = StoreConfig {
            backend,
            clickhouse,
            write_timeout: Duration::from_secs(
                cli.write_timeout_secs
                    .or(file_store.write_timeout_secs)
                    .unwrap_or(DEFAULT_WRITE_TIMEOUT_SECS),
            ),
        };

        let config = Self {
            capture_day,
            analytics,
            store,
            reports: file_config.reports.unwrap_or_default(),
            only_reports: cli.reports.clone(),
        };

        config.validate()?;

        tracing::debug!(
            capture_day = %config.capture_day,
            view_id = %config.analytics.view_id,
            store = %config.store.backend,
            reports = config.reports.definitions.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.analytics.view_id.trim().is_empty() {
            anyhow::bail!("Configuration error: analytics.view_id must not be empty");
        }

        if !(1..=MAX_PAGE_SIZE).contains(&self.analytics.page_size) {
            anyhow::bail!(
                "Configuration error: analytics.page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            );
        }

        if self.store.write_timeout.is_zero() {
            anyhow::bail!("Configuration error: store.write_timeout_secs must be greater than 0");
        }

        if let Some(ch) = &self.store.clickhouse
            && ch.url.trim().is_empty()
        {
            anyhow::bail!("Configuration error: store.clickhouse.url must not be empty");
        }

        self.reports
            .validate()
            .context("Configuration error: invalid report catalog")?;
        self.reports
            .select(&self.only_reports)
            .context("Configuration error: --report")?;

        Ok(())
    }
}

/// Get the profile config path (~/.ga-connector/ga-connector.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::StorageLevel;
    use std::io::Write;

    fn cli() -> CliConfig {
        CliConfig {
            capture_day: Some("2018-07-27".to_string()),
            view_id: Some("12345".to_string()),
            key_file: Some(PathBuf::from("/etc/ga/key.json")),
            ..Default::default()
        }
    }

    fn write_config(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_store_backend_serde() {
        let backend: StoreBackend = serde_json::from_str(r#""memory""#).unwrap();
        assert_eq!(backend, StoreBackend::Memory);
        assert_eq!(StoreBackend::Clickhouse.to_string(), "clickhouse");
    }

    #[test]
    fn test_file_config_parse_extra_fields() {
        let json = r#"{ "capture_day": "2018-07-27", "unknown_field": 123 }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.capture_day.as_deref(), Some("2018-07-27"));
        assert_eq!(config.extra.get("unknown_field").unwrap(), 123);
    }

    #[test]
    fn test_file_config_merge() {
        let mut base: FileConfig = serde_json::from_str(
            r#"{
                "analytics": { "view_id": "1", "page_delay_ms": 50 },
                "store": { "clickhouse": { "url": "http://base:8123", "database": "ga" } }
            }"#,
        )
        .unwrap();
        let overlay: FileConfig = serde_json::from_str(
            r#"{
                "analytics": { "view_id": "2" },
                "store": { "backend": "memory", "clickhouse": { "database": "ga_test" } }
            }"#,
        )
        .unwrap();

        base.merge(overlay);

        let analytics = base.analytics.as_ref().unwrap();
        assert_eq!(analytics.view_id.as_deref(), Some("2"));
        assert_eq!(analytics.page_delay_ms, Some(50));
        let store = base.store.as_ref().unwrap();
        assert_eq!(store.backend, Some(StoreBackend::Memory));
        let ch = store.clickhouse.as_ref().unwrap();
        assert_eq!(ch.url.as_deref(), Some("http://base:8123"));
        assert_eq!(ch.database.as_deref(), Some("ga_test"));
    }

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::from_layers(&cli(), FileConfig::default()).unwrap();

        assert_eq!(config.capture_day, NaiveDate::from_ymd_opt(2018, 7, 27).unwrap());
        assert_eq!(config.analytics.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.analytics.page_delay, Duration::from_millis(100));
        assert_eq!(config.analytics.max_empty_pages, None);
        assert_eq!(config.analytics.endpoint, ANALYTICS_REPORTING_ENDPOINT);
        assert_eq!(config.store.backend, StoreBackend::Clickhouse);
        assert_eq!(config.store.write_timeout, Duration::from_secs(3600));
        let ch = config.store.clickhouse.as_ref().unwrap();
        assert_eq!(ch.url, DEFAULT_CLICKHOUSE_URL);
        assert_eq!(ch.database, "default");
        assert!(ch.compression);
        assert_eq!(config.reports, ReportCatalog::churn());
    }

    #[test]
    fn test_app_config_cli_overrides_file() {
        let file = write_config(
            r#"{
                "capture_day": "2020-01-01",
                "analytics": { "view_id": "from-file", "page_delay_ms": 250, "max_empty_pages": 3 },
                "store": { "backend": "clickhouse", "clickhouse": { "url": "http://file:8123" } }
            }"#,
        );
        let cli = CliConfig {
            config: Some(file.path().to_path_buf()),
            clickhouse_url: Some("http://cli:8123".to_string()),
            max_empty_pages: Some(7),
            ..cli()
        };

        let config = AppConfig::load(&cli).unwrap();

        assert_eq!(config.capture_day, NaiveDate::from_ymd_opt(2018, 7, 27).unwrap());
        assert_eq!(config.analytics.view_id, "12345");
        assert_eq!(config.analytics.page_delay, Duration::from_millis(250));
        assert_eq!(config.analytics.max_empty_pages, Some(7));
        assert_eq!(config.store.clickhouse.unwrap().url, "http://cli:8123");
    }

    #[test]
    fn test_app_config_memory_store_has_no_clickhouse() {
        let cli = CliConfig {
            store: Some(StoreBackend::Memory),
            ..cli()
        };
        let config = AppConfig::from_layers(&cli, FileConfig::default()).unwrap();
        assert!(config.store.clickhouse.is_none());
    }

    #[test]
    fn test_app_config_catalog_from_file() {
        let file = write_config(
            r#"{
                "reports": {
                    "levels": { "hit_level": ["hits"] },
                    "definitions": [
                        { "name": "hits", "dimensions": ["dimension1", "dimension2", "dimension3"], "metrics": ["hits"] }
                    ]
                }
            }"#,
        );
        let cli = CliConfig {
            config: Some(file.path().to_path_buf()),
            ..cli()
        };

        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.reports.level_of("hits"), Some(StorageLevel::HitLevel));
        assert_eq!(config.reports.definitions.len(), 1);
    }

    #[test]
    fn test_missing_config_file() {
        let cli = CliConfig {
            config: Some(PathBuf::from("/nonexistent/ga-connector.json")),
            ..cli()
        };
        let err = AppConfig::load(&cli).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_validation_capture_day() {
        let cli = CliConfig {
            capture_day: Some("27/07/2018".to_string()),
            ..cli()
        };
        let err = AppConfig::from_layers(&cli, FileConfig::default()).unwrap_err();
        assert!(err.to_string().contains("expected YYYY-MM-DD"));

        let cli = CliConfig {
            capture_day: None,
            ..self::cli()
        };
        assert!(AppConfig::from_layers(&cli, FileConfig::default()).is_err());
    }

    #[test]
    fn test_validation_required_source_settings() {
        let cli_no_view = CliConfig {
            view_id: None,
            ..cli()
        };
        assert!(AppConfig::from_layers(&cli_no_view, FileConfig::default()).is_err());

        let cli_no_key = CliConfig {
            key_file: None,
            ..cli()
        };
        assert!(AppConfig::from_layers(&cli_no_key, FileConfig::default()).is_err());
    }

    #[test]
    fn test_validation_page_size() {
        let file: FileConfig =
            serde_json::from_str(r#"{ "analytics": { "page_size": 0 } }"#).unwrap();
        assert!(AppConfig::from_layers(&cli(), file).is_err());

        let file: FileConfig =
            serde_json::from_str(r#"{ "analytics": { "page_size": 100001 } }"#).unwrap();
        assert!(AppConfig::from_layers(&cli(), file).is_err());
    }

    #[test]
    fn test_validation_unknown_report_filter() {
        let cli = CliConfig {
            reports: vec!["chu_hits".to_string()],
            ..cli()
        };
        assert!(AppConfig::from_layers(&cli, FileConfig::default()).is_err());
    }

    #[test]
    fn test_validation_catalog_without_level() {
        let file: FileConfig = serde_json::from_str(
            r#"{ "reports": { "levels": {}, "definitions": [
                { "name": "orphan", "dimensions": ["dimension1"], "metrics": ["sessions"] }
            ] } }"#,
        )
        .unwrap();
        assert!(AppConfig::from_layers(&cli(), file).is_err());
    }
}
