//! ClickHouse schema definitions for report tables
//!
//! One table per report (`ga_<report>`), laid out by storage level:
//! - `ReplacingMergeTree(inserted_at)` keeps the last row written per key, so
//!   re-running a capture day overwrites instead of duplicating
//! - ORDER BY is the level's primary key (day, client, session, time)
//! - JSON payloads are stored verbatim as `String`

use crate::data::types::StorageLevel;

use super::error::ClickhouseError;

/// Check that a report table name is a plain identifier.
///
/// Report names are interpolated into DDL and INSERT text, so anything other
/// than `[A-Za-z0-9_]` is rejected.
pub fn validate_table_name(table: &str) -> Result<(), ClickhouseError> {
    let valid = !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !table.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(ClickhouseError::InvalidTableName(table.to_string()))
    }
}

/// Column definition for a level column
fn column_type(column: &str) -> &'static str {
    match column {
        "day_of_data_capture" => "Date",
        "json_meta" | "json_data" => "String CODEC(ZSTD(1))",
        _ => "String",
    }
}

/// Generate `CREATE TABLE IF NOT EXISTS` for a report table
pub fn report_table_ddl(level: StorageLevel, table: &str) -> String {
    let columns = level
        .columns()
        .iter()
        .map(|c| format!("    {:<24}{}", c, column_type(c)))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        r#"
CREATE TABLE IF NOT EXISTS {table} (
{columns},
    inserted_at             DateTime64(3) DEFAULT now64(3)
) ENGINE = ReplacingMergeTree(inserted_at)
PARTITION BY toYYYYMM(day_of_data_capture)
ORDER BY ({order_by})
"#,
        table = table,
        columns = columns,
        order_by = level.key_columns().join(", ")
    )
}

/// Generate the parameterized INSERT for a report table
pub fn insert_sql(level: StorageLevel, table: &str) -> String {
    let columns = level.columns();
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_table_name() {
        assert!(validate_table_name("ga_chu_users").is_ok());
        assert!(validate_table_name("ga_sessions2").is_ok());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("ga_users; DROP TABLE x").is_err());
        assert!(validate_table_name("ga-users").is_err());
        assert!(validate_table_name("1ga").is_err());
    }

    #[test]
    fn test_insert_sql_user_level() {
        assert_eq!(
            insert_sql(StorageLevel::UserLevel, "ga_users"),
            "INSERT INTO ga_users (client_id, day_of_data_capture, json_meta, json_data) VALUES (?, ?, ?, ?)"
        );
    }

    #[test]
    fn test_insert_sql_hit_level_placeholders() {
        let sql = insert_sql(StorageLevel::HitLevel, "ga_hits");
        assert!(sql.contains("tz_time, session_id"));
        assert_eq!(sql.matches('?').count(), 6);
    }

    #[test]
    fn test_ddl_orders_by_level_key() {
        let ddl = report_table_ddl(StorageLevel::SessionLevel, "ga_chu_sessions");
        assert!(ddl.contains("CREATE TABLE IF NOT EXISTS ga_chu_sessions"));
        assert!(ddl.contains("ORDER BY (day_of_data_capture, client_id, session_id)"));
        assert!(ddl.contains("ReplacingMergeTree(inserted_at)"));
        assert!(!ddl.contains("tz_time"));
    }

    #[test]
    fn test_ddl_hit_level_includes_tz_time() {
        let ddl = report_table_ddl(StorageLevel::HitLevel, "ga_hits");
        assert!(ddl.contains("tz_time"));
        assert!(ddl.contains("session_id, tz_time)"));
    }
}
