//! Core application

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::core::cli::{self, CliConfig};
use crate::core::config::AppConfig;
use crate::core::constants::{DEFAULT_LOG_FILTER, ENV_LOG};
use crate::data::{self, EntityStore};
use crate::domain::reports::FetchSettings;
use crate::domain::{RecordStore, ReportFetcher};
use crate::source::{GoogleAnalyticsClient, ReportSource};

/// Totals of one completed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub reports: usize,
    pub writes: usize,
}

pub struct CoreApp {
    pub config: AppConfig,
    pub source: Arc<dyn ReportSource>,
    pub store: Arc<dyn EntityStore>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let cli_config = cli::parse();
        let app = Self::init(&cli_config).await?;
        app.run_reports().await?;
        Ok(())
    }

    pub fn new(config: AppConfig, source: Arc<dyn ReportSource>, store: Arc<dyn EntityStore>) -> Self {
        Self {
            config,
            source,
            store,
        }
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;

        let client = GoogleAnalyticsClient::new(config.analytics.endpoint.clone())
            .context("Failed to create report source")?;

        let (_, store) = tokio::try_join!(
            async {
                client
                    .authenticate(&config.analytics.key_file)
                    .await
                    .context("Failed to authenticate report source")
            },
            async {
                data::init_store(&config.store)
                    .await
                    .context("Failed to initialize entity store")
            },
        )?;

        Ok(Self::new(config, Arc::new(client), store))
    }

    /// Register every level of the catalog, then fetch and store the selected
    /// reports in catalog order. Stops at the first report that fails.
    pub async fn run_reports(&self) -> Result<RunSummary> {
        let mut records = RecordStore::new(
            self.store.clone(),
            self.config.capture_day,
            self.config.store.write_timeout,
        );
        records
            .register(&self.config.reports.levels)
            .await
            .context("Failed to register report levels")?;

        let fetcher = ReportFetcher::new(
            self.source.clone(),
            FetchSettings {
                view_id: self.config.analytics.view_id.clone(),
                capture_day: self.config.capture_day,
                page_size: self.config.analytics.page_size,
                page_delay: self.config.analytics.page_delay,
                max_empty_pages: self.config.analytics.max_empty_pages,
            },
        );

        let selected = self.config.reports.select(&self.config.only_reports)?;
        tracing::info!(
            capture_day = records.capture_day(),
            store = records.backend_name(),
            reports = selected.len(),
            "Starting extraction"
        );

        let mut summary = RunSummary::default();
        for report in selected {
            let handles = fetcher
                .fetch_and_store(report, &records)
                .await
                .with_context(|| format!("Report '{}' failed", report.name))?;
            summary.reports += 1;
            summary.writes += handles.len();
        }

        tracing::info!(
            reports = summary.reports,
            writes = summary.writes,
            "Extraction complete"
        );
        Ok(summary)
    }

    fn init_logging() {
        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }
}
