//! Paginated report fetch
//!
//! Drives one report from its first page to the page without a next token,
//! dispatching a write per row as each page arrives. Every dispatched write
//! is awaited once, at the end, before the fetch returns.
//!
//! ```text
//!  sleep ─▶ batch_get(token) ─▶ parse_page ─▶ persist(row)* ─▶ next token? ─┐
//!    ▲                                                                      │
//!    └────────────────────────────── yes ───────────────────────────────────┘
//!                                    no ─▶ join barrier ─▶ handles
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;

use super::parse::parse_page;
use super::query::QueryParams;
use super::types::ReportDefinition;
use crate::domain::persist::{PersistError, PersistHandle, RecordStore, WriteError, join_all};
use crate::source::{ReportSource, SourceError};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Report '{report}': {source}")]
    Source {
        report: String,
        #[source]
        source: SourceError,
    },

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error("Report '{report}': {failed} of {total} writes failed")]
    Writes {
        report: String,
        failed: usize,
        total: usize,
        errors: Vec<WriteError>,
    },

    #[error("Report '{report}': {pages} consecutive pages without rows")]
    TooManyEmptyPages { report: String, pages: u32 },
}

impl FetchError {
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Source { source, .. } if source.is_authentication())
    }
}

/// Per-run request settings, fixed for every report of the run
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub view_id: String,
    pub capture_day: NaiveDate,
    pub page_size: u32,
    /// Courtesy delay before every page request
    pub page_delay: Duration,
    /// Consecutive rowless pages tolerated while a next token is present
    pub max_empty_pages: Option<u32>,
}

pub struct ReportFetcher {
    source: Arc<dyn ReportSource>,
    settings: FetchSettings,
}

impl ReportFetcher {
    pub fn new(source: Arc<dyn ReportSource>, settings: FetchSettings) -> Self {
        Self { source, settings }
    }

    /// Fetch every page of `report` and persist its rows.
    ///
    /// Returns the settled handles of all writes. If the fetch aborts part
    /// way, writes already dispatched are still awaited before the error is
    /// returned.
    pub async fn fetch_and_store(
        &self,
        report: &ReportDefinition,
        store: &RecordStore,
    ) -> Result<Vec<PersistHandle>, FetchError> {
        if !store.is_registered(&report.name) {
            return Err(PersistError::UnregisteredReport(report.name.clone()).into());
        }

        let mut query = QueryParams::for_report(
            report,
            &self.settings.view_id,
            self.settings.capture_day,
            self.settings.page_size,
        );
        let mut handles = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0u32;
        let mut rows = 0usize;
        let mut empty_streak = 0u32;

        let aborted = loop {
            tokio::time::sleep(self.settings.page_delay).await;
            query.set_page_token(page_token.take());

            let payload = match self.source.batch_get(&query).await {
                Ok(payload) => payload,
                Err(source) => {
                    break Some(FetchError::Source {
                        report: report.name.clone(),
                        source,
                    });
                }
            };
            pages += 1;

            let page = parse_page(&report.name, &payload);
            tracing::debug!(
                report = %report.name,
                page = pages,
                rows = page.rows.len(),
                has_next_page = page.next_page_token.is_some(),
                "Fetched report page"
            );

            let dispatched: Result<Vec<_>, _> = page
                .rows
                .iter()
                .map(|row| store.persist(&report.name, page.meta.as_ref(), row))
                .collect();
            match dispatched {
                Ok(page_handles) => handles.extend(page_handles),
                Err(e) => break Some(e.into()),
            }
            rows += page.rows.len();

            if page.rows.is_empty() {
                empty_streak += 1;
            } else {
                empty_streak = 0;
            }

            let Some(token) = page.next_page_token else {
                break None;
            };
            if self
                .settings
                .max_empty_pages
                .is_some_and(|limit| empty_streak > limit)
            {
                break Some(FetchError::TooManyEmptyPages {
                    report: report.name.clone(),
                    pages: empty_streak,
                });
            }
            page_token = Some(token);
        };

        let errors = join_all(&mut handles).await;

        if let Some(e) = aborted {
            tracing::error!(
                report = %report.name,
                error = %e,
                pages,
                drained = handles.len(),
                failed = errors.len(),
                "Report fetch aborted"
            );
            return Err(e);
        }

        tracing::info!(
            report = %report.name,
            pages,
            rows,
            writes = handles.len(),
            failed = errors.len(),
            "Report stored"
        );

        if !errors.is_empty() {
            return Err(FetchError::Writes {
                report: report.name.clone(),
                failed: errors.len(),
                total: handles.len(),
                errors,
            });
        }
        Ok(handles)
    }
}
