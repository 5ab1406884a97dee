//! Classification enums for stored report rows
//!
//! Shared by the record store (key derivation) and every entity store backend
//! (column layout, table bootstrap).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// STORAGE LEVEL
// ============================================================================

/// Granularity a report's rows are stored at.
///
/// Determines the primary key shape and the column layout of the report table:
///
/// | Level     | Columns                                                              |
/// |-----------|----------------------------------------------------------------------|
/// | `user`    | client_id, day_of_data_capture, json_meta, json_data                  |
/// | `session` | client_id, day_of_data_capture, session_id, json_meta, json_data      |
/// | `hit`     | client_id, day_of_data_capture, tz_time, session_id, json_meta, json_data |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageLevel {
    UserLevel,
    SessionLevel,
    HitLevel,
}

impl StorageLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserLevel => "user_level",
            Self::SessionLevel => "session_level",
            Self::HitLevel => "hit_level",
        }
    }

    /// Columns written for this level, in bind order
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::UserLevel => &["client_id", "day_of_data_capture", "json_meta", "json_data"],
            Self::SessionLevel => &[
                "client_id",
                "day_of_data_capture",
                "session_id",
                "json_meta",
                "json_data",
            ],
            Self::HitLevel => &[
                "client_id",
                "day_of_data_capture",
                "tz_time",
                "session_id",
                "json_meta",
                "json_data",
            ],
        }
    }

    /// Primary key columns, most significant first
    pub fn key_columns(&self) -> &'static [&'static str] {
        match self {
            Self::UserLevel => &["day_of_data_capture", "client_id"],
            Self::SessionLevel => &["day_of_data_capture", "client_id", "session_id"],
            Self::HitLevel => &["day_of_data_capture", "client_id", "session_id", "tz_time"],
        }
    }
}

impl fmt::Display for StorageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user_level" | "user" => Ok(Self::UserLevel),
            "session_level" | "session" => Ok(Self::SessionLevel),
            "hit_level" | "hit" => Ok(Self::HitLevel),
            other => Err(format!(
                "Invalid storage level '{}'. Valid: user_level, session_level, hit_level",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_level_serde() {
        let level: StorageLevel = serde_json::from_str(r#""session_level""#).unwrap();
        assert_eq!(level, StorageLevel::SessionLevel);
        assert_eq!(
            serde_json::to_string(&StorageLevel::HitLevel).unwrap(),
            r#""hit_level""#
        );
    }

    #[test]
    fn test_storage_level_from_str_short_forms() {
        assert_eq!("user".parse::<StorageLevel>(), Ok(StorageLevel::UserLevel));
        assert_eq!("HIT_LEVEL".parse::<StorageLevel>(), Ok(StorageLevel::HitLevel));
        assert!("page".parse::<StorageLevel>().is_err());
    }

    #[test]
    fn test_hit_level_binds_tz_time_before_session() {
        let columns = StorageLevel::HitLevel.columns();
        let tz = columns.iter().position(|c| *c == "tz_time").unwrap();
        let session = columns.iter().position(|c| *c == "session_id").unwrap();
        assert!(tz < session);
    }

    #[test]
    fn test_key_columns_are_written_columns() {
        for level in [
            StorageLevel::UserLevel,
            StorageLevel::SessionLevel,
            StorageLevel::HitLevel,
        ] {
            for key in level.key_columns() {
                assert!(level.columns().contains(key), "{level}: {key}");
            }
        }
    }
}
