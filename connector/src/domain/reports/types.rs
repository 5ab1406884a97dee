//! Report definitions and decoded page contents

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ============================================================================
// REPORT DEFINITION
// ============================================================================

/// One logical report: what to request and under which name to store it.
///
/// Dimension 0 must be the entity (client) identifier; dimension 1 the session
/// identifier for session and hit level reports; dimension 2 the time-zone
/// qualified hit timestamp for hit level reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDefinition {
    pub name: String,
    pub dimensions: Vec<String>,
    pub metrics: Vec<String>,
    /// Provider `dimensionFilterClauses`, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension_filters: Option<JsonValue>,
    /// Provider `metricFilterClauses`, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_filters: Option<JsonValue>,
}

impl ReportDefinition {
    pub fn new(name: &str, dimensions: &[&str], metrics: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            dimensions: dimensions.iter().map(|d| d.to_string()).collect(),
            metrics: metrics.iter().map(|m| m.to_string()).collect(),
            dimension_filters: None,
            metric_filters: None,
        }
    }

    pub fn with_dimension_filters(mut self, filters: JsonValue) -> Self {
        self.dimension_filters = Some(filters);
        self
    }

    pub fn with_metric_filters(mut self, filters: JsonValue) -> Self {
        self.metric_filters = Some(filters);
        self
    }
}

// ============================================================================
// PAGE CONTENTS
// ============================================================================

/// Column layout of a page: dimension and metric names as reported by the
/// provider (already `ga:`-qualified).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaDescriptor {
    pub dimensions: Vec<String>,
    pub metrics: Vec<String>,
}

/// A single metric cell. The provider sends numbers as strings, but both
/// shapes are accepted and written back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(serde_json::Number),
    Text(String),
}

/// One report row.
///
/// Serializes to the provider's row shape
/// `{"dimensions": [...], "metrics": [{"values": [...]}]}` so the stored
/// payload matches what the API returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireRow", into = "WireRow")]
pub struct RowRecord {
    pub dimension_values: Vec<String>,
    pub metric_values: Vec<MetricValue>,
}

impl RowRecord {
    pub fn new(dimension_values: Vec<String>, metric_values: Vec<MetricValue>) -> Self {
        Self {
            dimension_values,
            metric_values,
        }
    }

    pub fn dimension(&self, index: usize) -> Option<&str> {
        self.dimension_values.get(index).map(String::as_str)
    }
}

/// Metric values for one date range
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireDateRangeValues {
    #[serde(default)]
    values: Vec<MetricValue>,
}

/// Provider row shape
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireRow {
    #[serde(default)]
    dimensions: Vec<String>,
    #[serde(default)]
    metrics: Vec<WireDateRangeValues>,
}

impl From<WireRow> for RowRecord {
    fn from(row: WireRow) -> Self {
        // A single date range is requested, so this is normally one group
        let metric_values = row.metrics.into_iter().flat_map(|m| m.values).collect();
        Self {
            dimension_values: row.dimensions,
            metric_values,
        }
    }
}

impl From<RowRecord> for WireRow {
    fn from(row: RowRecord) -> Self {
        Self {
            dimensions: row.dimension_values,
            metrics: vec![WireDateRangeValues {
                values: row.metric_values,
            }],
        }
    }
}

/// Decoded result of one API call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageResult {
    pub rows: Vec<RowRecord>,
    /// `None` when the page was malformed
    pub meta: Option<MetaDescriptor>,
    pub next_page_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_record_decodes_provider_shape() {
        let row: RowRecord = serde_json::from_value(json!({
            "dimensions": ["GA1.2.123.456", "desktop"],
            "metrics": [{"values": ["3", "120.5"]}]
        }))
        .unwrap();

        assert_eq!(row.dimension(0), Some("GA1.2.123.456"));
        assert_eq!(row.dimension(2), None);
        assert_eq!(
            row.metric_values,
            vec![
                MetricValue::Text("3".to_string()),
                MetricValue::Text("120.5".to_string())
            ]
        );
    }

    #[test]
    fn test_row_record_payload_keeps_provider_shape() {
        let row = RowRecord::new(
            vec!["GA1.2.1.1".to_string()],
            vec![
                MetricValue::Number(serde_json::Number::from(7u64)),
                MetricValue::Text("x".to_string()),
            ],
        );
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            json!({"dimensions": ["GA1.2.1.1"], "metrics": [{"values": [7, "x"]}]})
        );
    }

    #[test]
    fn test_row_record_tolerates_missing_metrics() {
        let row: RowRecord = serde_json::from_value(json!({"dimensions": ["a"]})).unwrap();
        assert!(row.metric_values.is_empty());
    }

    #[test]
    fn test_report_definition_filters_default_to_none() {
        let def: ReportDefinition = serde_json::from_value(json!({
            "name": "users",
            "dimensions": ["dimension1"],
            "metrics": ["sessions"]
        }))
        .unwrap();
        assert_eq!(def, ReportDefinition::new("users", &["dimension1"], &["sessions"]));
    }
}
