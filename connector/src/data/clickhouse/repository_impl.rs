//! EntityStore trait implementation for ClickHouse
//!
//! ClickHouse operations are natively async so writes run directly on the
//! calling task; the record store supplies the spawn and the timeout.

use async_trait::async_trait;

use crate::data::error::DataError;
use crate::data::traits::EntityStore;
use crate::data::types::{BoundRow, PreparedStatement, StorageLevel, report_table};

use super::error::ClickhouseError;
use super::{ClickhouseService, schema};

#[async_trait]
impl EntityStore for ClickhouseService {
    fn backend_name(&self) -> &'static str {
        "clickhouse"
    }

    async fn prepare(
        &self,
        level: StorageLevel,
        report_name: &str,
    ) -> Result<PreparedStatement, DataError> {
        let table = report_table(report_name);
        schema::validate_table_name(&table)?;

        if self.ensure_schema() {
            self.client()
                .query(&schema::report_table_ddl(level, &table))
                .execute()
                .await
                .map_err(|e| ClickhouseError::SchemaFailed {
                    table: table.clone(),
                    error: e.to_string(),
                })?;
            tracing::debug!(table = %table, level = %level, "Report table ensured");
        }

        let sql = schema::insert_sql(level, &table);
        tracing::trace!(report = report_name, sql = %sql, "Prepared insert");
        Ok(PreparedStatement::new(level, report_name, sql))
    }

    async fn execute(&self, statement: &PreparedStatement, row: BoundRow) -> Result<(), DataError> {
        let mut query = self.client().query(&statement.sql);
        for value in row.values(statement.level) {
            query = query.bind(value);
        }
        query.execute().await.map_err(ClickhouseError::from)?;
        Ok(())
    }
}
