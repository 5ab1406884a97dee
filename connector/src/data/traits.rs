//! Entity store trait
//!
//! The record store depends only on this two-call contract: prepare a write
//! template once per report name, then execute it with bound values. Each
//! backend (ClickHouse, in-memory) implements it with its own logic;
//! connection management stays inside the backend.

use async_trait::async_trait;

use crate::data::error::DataError;
use crate::data::types::{BoundRow, PreparedStatement, StorageLevel};

/// Storage backend for report rows
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;

    /// Compile the write template for `report_name` at `level`
    async fn prepare(
        &self,
        level: StorageLevel,
        report_name: &str,
    ) -> Result<PreparedStatement, DataError>;

    /// Write one row. Rows with the same primary key overwrite each other.
    async fn execute(&self, statement: &PreparedStatement, row: BoundRow) -> Result<(), DataError>;
}
