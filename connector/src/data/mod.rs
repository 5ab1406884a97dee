//! Data storage layer
//!
//! Provides the entity stores report rows are written to:
//! - `clickhouse` - ClickHouse tables, one per report (production)
//! - `memory` - In-process map for dry runs and tests
//! - `types` - Storage levels, prepared statements and bound rows
//! - `traits` - The `EntityStore` contract every backend implements
//! - `error` - Unified error type for all backends

pub mod clickhouse;
pub mod error;
pub mod memory;
pub mod traits;
pub mod types;

pub use clickhouse::ClickhouseService;
pub use error::DataError;
pub use memory::MemoryStore;
pub use traits::EntityStore;
pub use types::{BoundRow, PreparedStatement, StorageLevel};

use std::sync::Arc;

use crate::core::config::{StoreBackend, StoreConfig};

/// Initialize the configured entity store
pub async fn init_store(config: &StoreConfig) -> Result<Arc<dyn EntityStore>, DataError> {
    let store: Arc<dyn EntityStore> = match config.backend {
        StoreBackend::Clickhouse => {
            let clickhouse = config.clickhouse.as_ref().ok_or_else(|| {
                DataError::Config("ClickHouse configuration required".to_string())
            })?;
            Arc::new(ClickhouseService::init(clickhouse).await?)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; rows are discarded on exit");
            Arc::new(MemoryStore::new())
        }
    };

    tracing::debug!(backend = store.backend_name(), "Entity store initialized");
    Ok(store)
}
