//! Google Analytics report extractor
//!
//! Pages through Reporting API v4 reports for one capture day and writes each
//! row to a per-report table keyed by user, session or hit.

mod app;
pub mod core;
pub mod data;
pub mod domain;
pub mod source;
pub mod utils;
