//! Report sources
//!
//! The fetcher talks to the provider only through `ReportSource`: one call per
//! page, returning the raw response body. Decoding happens in the fetcher so
//! a source never needs to understand the report shape.

mod error;
mod google;

pub use error::SourceError;
pub use google::{AccessTokens, GoogleAnalyticsClient};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::domain::reports::QueryParams;

/// Paged report provider
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Fetch one page for `query`
    async fn batch_get(&self, query: &QueryParams) -> Result<JsonValue, SourceError>;
}
