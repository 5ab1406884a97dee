use clap::Parser;

use std::path::PathBuf;

use super::config::StoreBackend;
use super::constants::{
    ENV_CLICKHOUSE_DATABASE, ENV_CLICKHOUSE_PASSWORD, ENV_CLICKHOUSE_URL, ENV_CLICKHOUSE_USER,
    ENV_CONFIG, ENV_DAY_OF_DATA_CAPTURE, ENV_KEY_FILE_LOCATION, ENV_MAX_EMPTY_PAGES,
    ENV_PAGE_DELAY_MS, ENV_STORE_BACKEND, ENV_VIEW_ID, ENV_WRITE_TIMEOUT_SECS,
};

#[derive(Parser)]
#[command(name = "ga-connector")]
#[command(version, about = "Google Analytics report extractor", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(long, short = 'c', env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Day to extract (YYYY-MM-DD)
    #[arg(long, short = 'd', env = ENV_DAY_OF_DATA_CAPTURE)]
    pub capture_day: Option<String>,

    /// Reporting view id
    #[arg(long, env = ENV_VIEW_ID)]
    pub view_id: Option<String>,

    /// Service-account key file
    #[arg(long, env = ENV_KEY_FILE_LOCATION)]
    pub key_file: Option<PathBuf>,

    /// Delay before each page request in milliseconds
    #[arg(long, env = ENV_PAGE_DELAY_MS)]
    pub page_delay_ms: Option<u64>,

    /// Abort a report after this many consecutive rowless pages
    #[arg(long, env = ENV_MAX_EMPTY_PAGES)]
    pub max_empty_pages: Option<u32>,

    /// Entity store (clickhouse or memory)
    #[arg(long, env = ENV_STORE_BACKEND, value_parser = parse_store_backend)]
    pub store: Option<StoreBackend>,

    /// ClickHouse HTTP URL
    #[arg(long, env = ENV_CLICKHOUSE_URL)]
    pub clickhouse_url: Option<String>,

    /// ClickHouse database
    #[arg(long, env = ENV_CLICKHOUSE_DATABASE)]
    pub clickhouse_database: Option<String>,

    /// ClickHouse user
    #[arg(long, env = ENV_CLICKHOUSE_USER)]
    pub clickhouse_user: Option<String>,

    /// ClickHouse password
    #[arg(long, env = ENV_CLICKHOUSE_PASSWORD, hide_env_values = true)]
    pub clickhouse_password: Option<String>,

    /// Per-write timeout in seconds
    #[arg(long, env = ENV_WRITE_TIMEOUT_SECS)]
    pub write_timeout_secs: Option<u64>,

    /// Only run the named report (repeatable)
    #[arg(long = "report", short = 'r')]
    pub reports: Vec<String>,
}

/// Parse store backend from CLI/env string
fn parse_store_backend(s: &str) -> Result<StoreBackend, String> {
    match s.to_lowercase().as_str() {
        "clickhouse" => Ok(StoreBackend::Clickhouse),
        "memory" => Ok(StoreBackend::Memory),
        _ => Err(format!(
            "Invalid store backend '{}'. Valid options: clickhouse, memory",
            s
        )),
    }
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub capture_day: Option<String>,
    pub view_id: Option<String>,
    pub key_file: Option<PathBuf>,
    pub page_delay_ms: Option<u64>,
    pub max_empty_pages: Option<u32>,
    pub store: Option<StoreBackend>,
    pub clickhouse_url: Option<String>,
    pub clickhouse_database: Option<String>,
    pub clickhouse_user: Option<String>,
    pub clickhouse_password: Option<String>,
    pub write_timeout_secs: Option<u64>,
    pub reports: Vec<String>,
}

impl From<Cli> for CliConfig {
    fn from(cli: Cli) -> Self {
        Self {
            config: cli.config,
            capture_day: cli.capture_day,
            view_id: cli.view_id,
            key_file: cli.key_file,
            page_delay_ms: cli.page_delay_ms,
            max_empty_pages: cli.max_empty_pages,
            store: cli.store,
            clickhouse_url: cli.clickhouse_url,
            clickhouse_database: cli.clickhouse_database,
            clickhouse_user: cli.clickhouse_user,
            clickhouse_password: cli.clickhouse_password,
            write_timeout_secs: cli.write_timeout_secs,
            reports: cli.reports,
        }
    }
}

/// Parse CLI arguments
pub fn parse() -> CliConfig {
    Cli::parse().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_store_backend() {
        assert_eq!(parse_store_backend("ClickHouse"), Ok(StoreBackend::Clickhouse));
        assert_eq!(parse_store_backend("memory"), Ok(StoreBackend::Memory));
        assert!(parse_store_backend("duckdb").is_err());
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "ga-connector",
            "--capture-day",
            "2018-07-27",
            "--store",
            "memory",
            "-r",
            "chu_users",
            "--report",
            "chu_sessions",
            "--max-empty-pages",
            "5",
        ])
        .unwrap();
        let config = CliConfig::from(cli);

        assert_eq!(config.capture_day.as_deref(), Some("2018-07-27"));
        assert_eq!(config.store, Some(StoreBackend::Memory));
        assert_eq!(config.reports, vec!["chu_users", "chu_sessions"]);
        assert_eq!(config.max_empty_pages, Some(5));
    }
}
