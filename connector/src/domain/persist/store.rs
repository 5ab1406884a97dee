//! Record store
//!
//! Classifies report names into storage levels, prepares one write statement
//! per report name, and turns each row into a non-blocking write.
//!
//! ## Write path
//!
//! `persist` derives the level's key from the row's dimensions, encodes meta
//! and row as JSON text, and spawns the write on the runtime wrapped in the
//! write timeout. The returned `PersistHandle` is the only way to observe the
//! outcome; nothing is awaited here.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;

use super::handle::{PersistHandle, WriteError};
use super::level::{KeyFields, normalize_client_id};
use crate::data::{BoundRow, DataError, EntityStore, PreparedStatement, StorageLevel};
use crate::domain::reports::{LevelMap, MetaDescriptor, RowRecord};

/// Stored in `json_meta` when a page carried no meta
const EMPTY_META: &str = "{}";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Report '{report}' is registered under both {first} and {second}")]
    Configuration {
        report: String,
        first: StorageLevel,
        second: StorageLevel,
    },

    #[error("Failed to prepare statement for report '{report}': {source}")]
    Prepare {
        report: String,
        #[source]
        source: DataError,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PersistError {
    #[error("Report '{0}' is not registered under any storage level")]
    UnregisteredReport(String),
}

/// Level index plus prepared statements, shared by every write of a run
pub struct RecordStore {
    store: Arc<dyn EntityStore>,
    capture_day: String,
    write_timeout: Duration,
    levels: HashMap<String, StorageLevel>,
    statements: HashMap<String, Arc<PreparedStatement>>,
}

impl RecordStore {
    pub fn new(store: Arc<dyn EntityStore>, capture_day: NaiveDate, write_timeout: Duration) -> Self {
        Self {
            store,
            capture_day: capture_day.format("%Y-%m-%d").to_string(),
            write_timeout,
            levels: HashMap::new(),
            statements: HashMap::new(),
        }
    }

    pub fn capture_day(&self) -> &str {
        &self.capture_day
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// Register report names by level and prepare their statements.
    ///
    /// The whole map is checked before anything is prepared: a name under two
    /// levels, in this call or against an earlier one, fails with
    /// `Configuration` and leaves the store unchanged. Re-registering a name
    /// at the level it already has is a no-op.
    pub async fn register(&mut self, levels: &LevelMap) -> Result<(), RegistryError> {
        let mut incoming: HashMap<&str, StorageLevel> = HashMap::new();
        for (level, names) in levels {
            for name in names {
                let known = incoming
                    .get(name.as_str())
                    .copied()
                    .or_else(|| self.levels.get(name).copied());
                match known {
                    Some(first) if first != *level => {
                        return Err(RegistryError::Configuration {
                            report: name.clone(),
                            first,
                            second: *level,
                        });
                    }
                    _ => {
                        incoming.insert(name.as_str(), *level);
                    }
                }
            }
        }

        for (name, level) in incoming {
            if self.statements.contains_key(name) {
                continue;
            }

            let statement = self
                .store
                .prepare(level, name)
                .await
                .map_err(|source| RegistryError::Prepare {
                    report: name.to_string(),
                    source,
                })?;

            tracing::debug!(
                report = name,
                level = %level,
                table = %statement.table,
                "Prepared report statement"
            );

            self.levels.insert(name.to_string(), level);
            self.statements.insert(name.to_string(), Arc::new(statement));
        }

        Ok(())
    }

    #[cfg(test)]
    fn level_of(&self, report_name: &str) -> Option<StorageLevel> {
        self.levels.get(report_name).copied()
    }

    pub fn is_registered(&self, report_name: &str) -> bool {
        self.statements.contains_key(report_name)
    }

    /// Dispatch one row write and return its handle immediately.
    ///
    /// Only an unregistered report name fails here. Row-level problems (a
    /// missing key dimension, an encoding failure) come back as a handle that
    /// is already failed, so they surface at the barrier with the rest.
    pub fn persist(
        &self,
        report_name: &str,
        meta: Option<&MetaDescriptor>,
        row: &RowRecord,
    ) -> Result<PersistHandle, PersistError> {
        let statement = self
            .statements
            .get(report_name)
            .cloned()
            .ok_or_else(|| PersistError::UnregisteredReport(report_name.to_string()))?;
        let level = statement.level;
        let table = statement.table.clone();

        let key = match KeyFields::derive(level, &row.dimension_values) {
            Ok(key) => key,
            Err(source) => {
                tracing::warn!(report = report_name, error = %source, "Row rejected");
                return Ok(PersistHandle::rejected(
                    table.clone(),
                    normalize_client_id(row.dimension(0)),
                    None,
                    WriteError::MissingDimension { table, source },
                ));
            }
        };

        let payload = match encode(meta, row) {
            Ok(payload) => payload,
            Err(e) => {
                return Ok(PersistHandle::rejected(
                    table.clone(),
                    key.client_id,
                    key.session_id,
                    WriteError::Encode {
                        table,
                        message: e.to_string(),
                    },
                ));
            }
        };

        let bound = BoundRow {
            client_id: key.client_id.clone(),
            day_of_data_capture: self.capture_day.clone(),
            session_id: key.session_id.clone(),
            tz_time: key.tz_time,
            json_meta: payload.0,
            json_data: payload.1,
        };

        let store = Arc::clone(&self.store);
        let timeout = self.write_timeout;
        let task_table = table.clone();
        let task = tokio::spawn(async move {
            match tokio::time::timeout(timeout, store.execute(&statement, bound)).await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => {
                    tracing::warn!(table = %task_table, error = %e, transient = e.is_transient(), "Row write failed");
                    Err(WriteError::Store {
                        table: task_table,
                        message: e.to_string(),
                    })
                }
                Err(_) => {
                    tracing::warn!(table = %task_table, timeout_secs = timeout.as_secs_f64(), "Row write timed out");
                    Err(WriteError::Timeout {
                        table: task_table,
                        timeout,
                    })
                }
            }
        });

        Ok(PersistHandle::pending(
            table,
            key.client_id,
            key.session_id,
            task,
        ))
    }
}

/// JSON text for the meta and data columns
fn encode(meta: Option<&MetaDescriptor>, row: &RowRecord) -> Result<(String, String), serde_json::Error> {
    let json_meta = match meta {
        Some(meta) => serde_json::to_string(meta)?,
        None => EMPTY_META.to_string(),
    };
    let json_data = serde_json::to_string(row)?;
    Ok((json_meta, json_data))
}
