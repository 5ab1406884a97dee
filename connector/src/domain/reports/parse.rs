//! Defensive page decoding
//!
//! The provider can return partially populated pages: a header with no data
//! rows, an empty report list, or an error body. A page that cannot be decoded
//! contributes no rows and no meta, and the fetch carries on with the next
//! page token if one is present. Inside a well-formed page, a row that does
//! not decode is dropped on its own and the rest of the page is kept.

use serde::Deserialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::types::{MetaDescriptor, PageResult, RowRecord};

/// Why a page was skipped
#[derive(Debug, Error)]
pub enum MalformedPage {
    #[error("response has no reports")]
    NoReports,
    #[error("report has no data rows")]
    MissingRows,
    #[error("report has no column header")]
    MissingColumnHeader,
    #[error("column header has no metric header entries")]
    MissingMetricHeader,
    #[error("unexpected report shape: {0}")]
    Shape(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireReport {
    column_header: Option<WireColumnHeader>,
    data: Option<WireReportData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireColumnHeader {
    dimensions: Option<Vec<String>>,
    metric_header: Option<WireMetricHeader>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMetricHeader {
    metric_header_entries: Option<Vec<WireMetricHeaderEntry>>,
}

#[derive(Debug, Deserialize)]
struct WireMetricHeaderEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct WireReportData {
    rows: Option<Vec<JsonValue>>,
}

/// A row of an otherwise valid page that could not be decoded
#[derive(Debug)]
pub struct RejectedRow {
    pub index: usize,
    pub error: serde_json::Error,
    pub raw: JsonValue,
}

/// Decoded contents of a well-formed page
#[derive(Debug)]
pub struct DecodedPage {
    pub rows: Vec<RowRecord>,
    pub meta: MetaDescriptor,
    pub rejected: Vec<RejectedRow>,
}

/// First report of a batch response, if any
fn first_report(payload: &JsonValue) -> Option<&JsonValue> {
    payload.get("reports")?.get(0)
}

/// Read the next page token. Empty tokens count as absent.
pub fn next_page_token(payload: &JsonValue) -> Option<String> {
    first_report(payload)?
        .get("nextPageToken")?
        .as_str()
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Decode rows and meta, failing on any missing piece of the page structure.
/// Rows are decoded one at a time; a bad row is set aside in `rejected`.
pub fn decode_page(payload: &JsonValue) -> Result<DecodedPage, MalformedPage> {
    let report = first_report(payload).ok_or(MalformedPage::NoReports)?;
    let report = WireReport::deserialize(report)?;

    let rows = report
        .data
        .and_then(|d| d.rows)
        .ok_or(MalformedPage::MissingRows)?;
    let header = report
        .column_header
        .ok_or(MalformedPage::MissingColumnHeader)?;
    let dimensions = header
        .dimensions
        .ok_or(MalformedPage::MissingColumnHeader)?;
    let metrics = header
        .metric_header
        .and_then(|m| m.metric_header_entries)
        .ok_or(MalformedPage::MissingMetricHeader)?
        .into_iter()
        .map(|entry| entry.name)
        .collect();

    let mut decoded = Vec::with_capacity(rows.len());
    let mut rejected = Vec::new();
    for (index, raw) in rows.into_iter().enumerate() {
        match RowRecord::deserialize(&raw) {
            Ok(row) => decoded.push(row),
            Err(error) => rejected.push(RejectedRow { index, error, raw }),
        }
    }

    Ok(DecodedPage {
        rows: decoded,
        meta: MetaDescriptor { dimensions, metrics },
        rejected,
    })
}

/// Parse one page. Never fails: malformed pages are logged with the report
/// name and the raw payload, and yield no rows.
pub fn parse_page(report_name: &str, payload: &JsonValue) -> PageResult {
    let next_page_token = next_page_token(payload);

    match decode_page(payload) {
        Ok(page) => {
            for row in &page.rejected {
                tracing::warn!(
                    report = report_name,
                    row = row.index,
                    error = %row.error,
                    raw = %row.raw,
                    "Undecodable report row, skipping it"
                );
            }
            PageResult {
                rows: page.rows,
                meta: Some(page.meta),
                next_page_token,
            }
        }
        Err(e) => {
            tracing::warn!(
                report = report_name,
                error = %e,
                payload = %payload,
                has_next_page = next_page_token.is_some(),
                "Malformed report page, skipping its rows"
            );
            PageResult {
                rows: Vec::new(),
                meta: None,
                next_page_token,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_payload(token: Option<&str>) -> JsonValue {
        let mut report = json!({
            "columnHeader": {
                "dimensions": ["ga:dimension1", "ga:deviceCategory"],
                "metricHeader": {
                    "metricHeaderEntries": [
                        {"name": "ga:sessions", "type": "INTEGER"},
                        {"name": "ga:bounces", "type": "INTEGER"}
                    ]
                }
            },
            "data": {
                "rows": [
                    {"dimensions": ["GA1.2.1.1", "desktop"], "metrics": [{"values": ["1", "0"]}]},
                    {"dimensions": ["GA1.2.2.2", "mobile"], "metrics": [{"values": ["4", "2"]}]}
                ],
                "rowCount": 2
            }
        });
        if let Some(token) = token {
            report["nextPageToken"] = json!(token);
        }
        json!({ "reports": [report] })
    }

    #[test]
    fn test_parse_valid_page() {
        let page = parse_page("chu_users", &valid_payload(Some("2")));

        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.rows[1].dimension(1), Some("mobile"));
        assert_eq!(
            page.meta,
            Some(MetaDescriptor {
                dimensions: vec!["ga:dimension1".to_string(), "ga:deviceCategory".to_string()],
                metrics: vec!["ga:sessions".to_string(), "ga:bounces".to_string()],
            })
        );
        assert_eq!(page.next_page_token.as_deref(), Some("2"));
    }

    #[test]
    fn test_missing_rows_keeps_token() {
        let mut payload = valid_payload(Some("20000"));
        payload["reports"][0]["data"] = json!({"totals": [{"values": ["0"]}]});

        let page = parse_page("chu_users", &payload);
        assert!(page.rows.is_empty());
        assert!(page.meta.is_none());
        assert_eq!(page.next_page_token.as_deref(), Some("20000"));
    }

    #[test]
    fn test_missing_column_header_drops_rows_too() {
        let mut payload = valid_payload(None);
        payload["reports"][0]
            .as_object_mut()
            .unwrap()
            .remove("columnHeader");

        assert!(matches!(
            decode_page(&payload),
            Err(MalformedPage::MissingColumnHeader)
        ));
        let page = parse_page("chu_users", &payload);
        assert!(page.rows.is_empty());
        assert!(page.meta.is_none());
    }

    #[test]
    fn test_missing_metric_header() {
        let mut payload = valid_payload(None);
        payload["reports"][0]["columnHeader"]
            .as_object_mut()
            .unwrap()
            .remove("metricHeader");
        assert!(matches!(
            decode_page(&payload),
            Err(MalformedPage::MissingMetricHeader)
        ));
    }

    #[test]
    fn test_empty_reports_and_error_bodies() {
        assert!(matches!(
            decode_page(&json!({"reports": []})),
            Err(MalformedPage::NoReports)
        ));
        assert!(matches!(
            decode_page(&json!({"error": {"code": 503}})),
            Err(MalformedPage::NoReports)
        ));
        assert!(matches!(
            decode_page(&json!("<html>Service Unavailable</html>")),
            Err(MalformedPage::NoReports)
        ));

        let page = parse_page("chu_users", &json!({"reports": []}));
        assert_eq!(page, PageResult::default());
    }

    #[test]
    fn test_wrong_types_are_malformed() {
        let payload = json!({"reports": [{"columnHeader": {"dimensions": "oops"}, "data": {"rows": []}}]});
        assert!(matches!(decode_page(&payload), Err(MalformedPage::Shape(_))));
    }

    #[test]
    fn test_bad_row_dropped_alone() {
        let mut payload = valid_payload(Some("3"));
        payload["reports"][0]["data"]["rows"] = json!([
            {"dimensions": ["GA1.2.1.1", "desktop"], "metrics": [{"values": ["1", "0"]}]},
            {"dimensions": ["GA1.2.2.2", "mobile"], "metrics": [{"values": [null, "2"]}]},
            {"dimensions": ["GA1.2.3.3", "tablet"], "metrics": [{"values": ["5", "1"]}]}
        ]);

        let decoded = decode_page(&payload).unwrap();
        assert_eq!(decoded.rejected.len(), 1);
        assert_eq!(decoded.rejected[0].index, 1);

        let page = parse_page("chu_users", &payload);
        let clients: Vec<_> = page.rows.iter().map(|r| r.dimension(0).unwrap()).collect();
        assert_eq!(clients, vec!["GA1.2.1.1", "GA1.2.3.3"]);
        assert!(page.meta.is_some());
        assert_eq!(page.next_page_token.as_deref(), Some("3"));
    }

    #[test]
    fn test_empty_token_is_absent() {
        assert_eq!(next_page_token(&valid_payload(Some(""))), None);
        assert_eq!(next_page_token(&valid_payload(None)), None);
        assert_eq!(next_page_token(&json!({})), None);
    }
}
