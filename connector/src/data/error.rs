//! Unified error type for the data layer
//!
//! Wraps backend-specific errors while preserving which backend produced them.

use thiserror::Error;

use super::clickhouse::ClickhouseError;

/// Unified error type for entity store operations
#[derive(Error, Debug)]
pub enum DataError {
    /// ClickHouse backend error
    #[error("ClickHouse error: {0}")]
    Clickhouse(#[from] ClickhouseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Statement used on a backend that never prepared it
    #[error("Statement for report '{report}' was not prepared on {backend}")]
    NotPrepared {
        backend: &'static str,
        report: String,
    },
}

impl DataError {
    /// Check if this error is worth logging as a possibly transient condition
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Clickhouse(e) => e.is_transient(),
            Self::Config(_) | Self::NotPrepared { .. } => false,
        }
    }
}

impl From<clickhouse::error::Error> for DataError {
    fn from(e: clickhouse::error::Error) -> Self {
        Self::Clickhouse(ClickhouseError::Database(e))
    }
}
