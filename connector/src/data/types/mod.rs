//! Shared data types for all entity store backends
//!
//! Types used by both the ClickHouse and in-memory backends so the record
//! store sees one column layout regardless of where rows land.

mod enums;
mod statement;

pub use enums::StorageLevel;
pub use statement::{BoundRow, PreparedStatement, TABLE_PREFIX, report_table};
