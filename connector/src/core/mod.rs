//! Core application infrastructure

pub mod cli;
pub mod config;
pub mod constants;

pub use crate::app::{CoreApp, RunSummary};
pub use cli::CliConfig;
pub use config::{AppConfig, StoreBackend, StoreConfig};
