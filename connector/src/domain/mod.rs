//! Domain logic for report extraction
//!
//! - `reports` - Report definitions, request building, page decoding, fetch loop
//! - `persist` - Storage levels, key derivation, asynchronous writes

pub mod persist;
pub mod reports;

pub use persist::RecordStore;
pub use reports::{ReportCatalog, ReportFetcher};
