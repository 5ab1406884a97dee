//! ClickHouse error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClickhouseError {
    #[error("Database error: {0}")]
    Database(#[from] clickhouse::error::Error),

    #[error("Invalid report table name '{0}': only ASCII letters, digits and '_' are allowed")]
    InvalidTableName(String),

    #[error("Failed to create table {table}: {error}")]
    SchemaFailed { table: String, error: String },

    #[error("Connection error: {0}")]
    Connection(String),
}

impl ClickhouseError {
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Database(e) => matches!(
                e,
                clickhouse::error::Error::Network(_) | clickhouse::error::Error::TimedOut
            ),
            Self::Connection(_) => true,
            Self::InvalidTableName(_) | Self::SchemaFailed { .. } => false,
        }
    }
}
