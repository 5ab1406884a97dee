//! Prepared write statements and their bound values

use super::enums::StorageLevel;

/// Prefix for report tables (`ga_<report_name>`)
pub const TABLE_PREFIX: &str = "ga_";

/// Table name for a report
pub fn report_table(report_name: &str) -> String {
    format!("{}{}", TABLE_PREFIX, report_name)
}

/// Write template compiled once per report name.
///
/// Holds the level-specific column layout so every backend binds values in
/// the same order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedStatement {
    pub report_name: String,
    pub level: StorageLevel,
    pub table: String,
    /// Backend-specific statement text (empty for backends that don't use SQL)
    pub sql: String,
}

impl PreparedStatement {
    pub fn new(level: StorageLevel, report_name: &str, sql: String) -> Self {
        Self {
            report_name: report_name.to_string(),
            level,
            table: report_table(report_name),
            sql,
        }
    }
}

/// Values for one row write.
///
/// `session_id` is set for session and hit levels, `tz_time` for hit level only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundRow {
    pub client_id: String,
    pub day_of_data_capture: String,
    pub session_id: Option<String>,
    pub tz_time: Option<String>,
    pub json_meta: String,
    pub json_data: String,
}

impl BoundRow {
    fn column(&self, name: &str) -> &str {
        match name {
            "client_id" => &self.client_id,
            "day_of_data_capture" => &self.day_of_data_capture,
            "session_id" => self.session_id.as_deref().unwrap_or_default(),
            "tz_time" => self.tz_time.as_deref().unwrap_or_default(),
            "json_meta" => &self.json_meta,
            "json_data" => &self.json_data,
            _ => "",
        }
    }

    /// Values in the bind order of `level`
    pub fn values(&self, level: StorageLevel) -> Vec<&str> {
        level.columns().iter().map(|c| self.column(c)).collect()
    }

    /// Primary key values of `level`, most significant first
    pub fn primary_key(&self, level: StorageLevel) -> Vec<String> {
        level
            .key_columns()
            .iter()
            .map(|c| self.column(c).to_string())
            .collect()
    }
}
