//! Report request building
//!
//! Maps a `ReportDefinition` plus the run's fixed date range and page size to
//! the provider's report request object. Only the page token changes between
//! pages of one fetch.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value as JsonValue;

use super::types::ReportDefinition;

/// Prefix qualifying dimension and metric names for the provider
pub const API_NAME_PREFIX: &str = "ga:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: String,
    pub end_date: String,
}

impl DateRange {
    /// Range covering exactly one day
    pub fn single_day(day: NaiveDate) -> Self {
        let day = day.format("%Y-%m-%d").to_string();
        Self {
            start_date: day.clone(),
            end_date: day,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DimensionSpec {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricSpec {
    pub expression: String,
}

fn qualify(name: &str) -> String {
    if name.starts_with(API_NAME_PREFIX) {
        name.to_string()
    } else {
        format!("{}{}", API_NAME_PREFIX, name)
    }
}

/// One report request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    pub view_id: String,
    pub date_ranges: Vec<DateRange>,
    pub dimensions: Vec<DimensionSpec>,
    pub metrics: Vec<MetricSpec>,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension_filter_clauses: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_filter_clauses: Option<JsonValue>,
}

impl QueryParams {
    pub fn for_report(
        report: &ReportDefinition,
        view_id: &str,
        capture_day: NaiveDate,
        page_size: u32,
    ) -> Self {
        Self {
            view_id: view_id.to_string(),
            date_ranges: vec![DateRange::single_day(capture_day)],
            dimensions: report
                .dimensions
                .iter()
                .map(|d| DimensionSpec { name: qualify(d) })
                .collect(),
            metrics: report
                .metrics
                .iter()
                .map(|m| MetricSpec {
                    expression: qualify(m),
                })
                .collect(),
            page_size,
            page_token: None,
            dimension_filter_clauses: report.dimension_filters.clone(),
            metric_filter_clauses: report.metric_filters.clone(),
        }
    }

    pub fn set_page_token(&mut self, token: Option<String>) {
        self.page_token = token;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2018, 7, 27).unwrap()
    }

    #[test]
    fn test_query_params_wire_shape() {
        let report = ReportDefinition::new("chu_users", &["dimension1"], &["sessions", "bounces"]);
        let query = QueryParams::for_report(&report, "12345", day(), 10_000);

        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({
                "viewId": "12345",
                "dateRanges": [{"startDate": "2018-07-27", "endDate": "2018-07-27"}],
                "dimensions": [{"name": "ga:dimension1"}],
                "metrics": [{"expression": "ga:sessions"}, {"expression": "ga:bounces"}],
                "pageSize": 10000
            })
        );
    }

    #[test]
    fn test_page_token_and_filters_serialized_when_present() {
        let report = ReportDefinition::new("users", &["dimension1"], &["sessions"])
            .with_dimension_filters(json!([{"filters": [{"dimensionName": "ga:country"}]}]))
            .with_metric_filters(json!([{"filters": []}]));
        let mut query = QueryParams::for_report(&report, "1", day(), 100);
        query.set_page_token(Some("10000".to_string()));

        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value["pageToken"], "10000");
        assert_eq!(
            value["dimensionFilterClauses"][0]["filters"][0]["dimensionName"],
            "ga:country"
        );
        assert!(value.get("metricFilterClauses").is_some());
    }

    #[test]
    fn test_already_qualified_names_kept() {
        let report = ReportDefinition::new("users", &["ga:dimension1"], &["ga:sessions"]);
        let query = QueryParams::for_report(&report, "1", day(), 100);
        assert_eq!(query.dimensions[0].name, "ga:dimension1");
        assert_eq!(query.metrics[0].expression, "ga:sessions");
    }
}
