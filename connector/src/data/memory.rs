//! In-memory entity store
//!
//! Keeps the last row written per `(table, primary key)`, mirroring the
//! overwrite-by-key semantics of the ClickHouse tables.
//!
//! ## Limitations
//!
//! Suitable for dry runs and tests only:
//! - Process exit = all rows lost
//! - No size bound

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::error::DataError;
use super::traits::EntityStore;
use super::types::{BoundRow, PreparedStatement, StorageLevel};

/// Storage key: table plus primary key values
type RecordKey = (String, Vec<String>);

/// In-memory entity store
#[derive(Default)]
pub struct MemoryStore {
    prepared: RwLock<HashSet<String>>,
    records: RwLock<BTreeMap<RecordKey, BoundRow>>,
    /// Total successful executes (including overwrites)
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct stored records across all tables
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Number of executed writes, counting overwrites
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Stored rows of one table, ordered by primary key
    pub fn rows(&self, table: &str) -> Vec<BoundRow> {
        self.records
            .read()
            .iter()
            .filter(|((t, _), _)| t == table)
            .map(|(_, row)| row.clone())
            .collect()
    }

    /// Primary keys stored in one table, ordered
    pub fn keys(&self, table: &str) -> Vec<Vec<String>> {
        self.records
            .read()
            .keys()
            .filter(|(t, _)| t == table)
            .map(|(_, key)| key.clone())
            .collect()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn prepare(
        &self,
        level: StorageLevel,
        report_name: &str,
    ) -> Result<PreparedStatement, DataError> {
        let statement = PreparedStatement::new(level, report_name, String::new());
        self.prepared.write().insert(statement.table.clone());
        Ok(statement)
    }

    async fn execute(&self, statement: &PreparedStatement, row: BoundRow) -> Result<(), DataError> {
        if !self.prepared.read().contains(&statement.table) {
            return Err(DataError::NotPrepared {
                backend: self.backend_name(),
                report: statement.report_name.clone(),
            });
        }

        let key = (statement.table.clone(), row.primary_key(statement.level));
        self.records.write().insert(key, row);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_row(client_id: &str, data: &str) -> BoundRow {
        BoundRow {
            client_id: client_id.to_string(),
            day_of_data_capture: "2018-07-27".to_string(),
            session_id: None,
            tz_time: None,
            json_meta: "{}".to_string(),
            json_data: data.to_string(),
        }
    }

    #[tokio::test]
    async fn test_execute_requires_prepare() {
        let store = MemoryStore::new();
        let statement = PreparedStatement::new(StorageLevel::UserLevel, "users", String::new());
        let err = store
            .execute(&statement, user_row("GA1.1", "{}"))
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::NotPrepared { .. }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_same_key_overwrites() {
        let store = MemoryStore::new();
        let statement = store
            .prepare(StorageLevel::UserLevel, "users")
            .await
            .unwrap();

        store
            .execute(&statement, user_row("GA1.1", "first"))
            .await
            .unwrap();
        store
            .execute(&statement, user_row("GA1.1", "second"))
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.write_count(), 2);
        assert_eq!(store.rows("ga_users")[0].json_data, "second");
    }

    #[tokio::test]
    async fn test_tables_are_isolated() {
        let store = MemoryStore::new();
        let users = store
            .prepare(StorageLevel::UserLevel, "users")
            .await
            .unwrap();
        let devices = store
            .prepare(StorageLevel::UserLevel, "devices")
            .await
            .unwrap();

        store.execute(&users, user_row("GA1.1", "u")).await.unwrap();
        store
            .execute(&devices, user_row("GA1.1", "d"))
            .await
            .unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(
            store.keys("ga_devices"),
            vec![vec!["2018-07-27".to_string(), "GA1.1".to_string()]]
        );
    }
}
