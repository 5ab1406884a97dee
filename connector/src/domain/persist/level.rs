//! Level-based key derivation
//!
//! Pure functions from a row's dimension values to the key fields of its
//! storage level.

use thiserror::Error;

use crate::data::StorageLevel;

/// Prefix every provider client id carries
pub const CLIENT_ID_PREFIX: &str = "GA";

/// Stored in place of client ids without the provider prefix
pub const UNKNOWN_CLIENT_ID: &str = "UNKNOWN";

pub const CLIENT_ID_INDEX: usize = 0;
pub const SESSION_ID_INDEX: usize = 1;
pub const TZ_TIME_INDEX: usize = 2;

/// A row lacks a dimension its level's key is built from
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{level} row has no '{field}' at dimension {index}")]
pub struct MissingDimension {
    pub level: StorageLevel,
    pub field: &'static str,
    pub index: usize,
}

/// Keep ids with the provider prefix, replace anything else.
///
/// Rows are never dropped over a bad id; they land under `UNKNOWN`.
pub fn normalize_client_id(raw: Option<&str>) -> String {
    match raw {
        Some(id) if id.starts_with(CLIENT_ID_PREFIX) => id.to_string(),
        _ => UNKNOWN_CLIENT_ID.to_string(),
    }
}

/// Key fields of one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFields {
    pub client_id: String,
    pub session_id: Option<String>,
    pub tz_time: Option<String>,
}

impl KeyFields {
    pub fn derive(level: StorageLevel, dimensions: &[String]) -> Result<Self, MissingDimension> {
        let client_id = normalize_client_id(dimensions.get(CLIENT_ID_INDEX).map(String::as_str));

        let required = |field: &'static str, index: usize| {
            dimensions
                .get(index)
                .cloned()
                .ok_or(MissingDimension {
                    level,
                    field,
                    index,
                })
        };

        let (session_id, tz_time) = match level {
            StorageLevel::UserLevel => (None, None),
            StorageLevel::SessionLevel => (Some(required("session_id", SESSION_ID_INDEX)?), None),
            StorageLevel::HitLevel => (
                Some(required("session_id", SESSION_ID_INDEX)?),
                Some(required("tz_time", TZ_TIME_INDEX)?),
            ),
        };

        Ok(Self {
            client_id,
            session_id,
            tz_time,
        })
    }
}
