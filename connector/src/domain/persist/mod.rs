//! Row persistence
//!
//! - `level` - Key derivation per storage level
//! - `store` - Level registry, statement preparation and write dispatch
//! - `handle` - Write handles and the join barrier

mod handle;
mod level;
mod store;

pub use handle::{PersistHandle, WriteError, join_all};
pub use level::{
    CLIENT_ID_PREFIX, KeyFields, MissingDimension, UNKNOWN_CLIENT_ID, normalize_client_id,
};
pub use store::{PersistError, RecordStore, RegistryError};
