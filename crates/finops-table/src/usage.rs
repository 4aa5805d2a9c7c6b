//! Monitor-metrics usage payload (JSON) → rows.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::NormalizeResult;
use crate::focus::canonical_decimal;
use crate::records::{Records, Row};

/// Header of every usage batch; the value lives at index 3.
pub const USAGE_HEADER: [&str; 5] = ["ResourceId", "metricName", "timestamp", "average", "unit"];

/// Position of `average` in [`USAGE_HEADER`].
pub const USAGE_VALUE_INDEX: usize = 3;

#[derive(Debug, Deserialize)]
struct MetricsResponse {
    #[serde(default)]
    value: Vec<MetricSeries>,
}

#[derive(Debug, Deserialize)]
struct MetricSeries {
    #[serde(default)]
    name: LocalizedName,
    #[serde(default)]
    unit: String,
    #[serde(default)]
    timeseries: Vec<TimeSeries>,
}

#[derive(Debug, Default, Deserialize)]
struct LocalizedName {
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct TimeSeries {
    #[serde(default)]
    data: Vec<DataPoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DataPoint {
    #[serde(default)]
    time_stamp: String,
    #[serde(default)]
    average: Option<Value>,
}

pub fn usage_header() -> Row {
    USAGE_HEADER.iter().map(|c| c.to_string()).collect()
}

/// Flatten every data point of every series into one row tagged with
/// `resource_id`. Points without an average are skipped.
pub fn parse_usage(data: &[u8], resource_id: &str) -> NormalizeResult<Records> {
    let response: MetricsResponse = serde_json::from_slice(data)?;
    let mut rows = Vec::new();
    for series in &response.value {
        for ts in &series.timeseries {
            for point in &ts.data {
                let average = match &point.average {
                    Some(Value::Number(n)) => canonical_decimal(&n.to_string()),
                    Some(Value::String(s)) if !s.is_empty() => canonical_decimal(s),
                    _ => continue,
                };
                rows.push(vec![
                    resource_id.to_string(),
                    series.name.value.clone(),
                    timestamp(&point.time_stamp),
                    average,
                    series.unit.clone(),
                ]);
            }
        }
    }
    Ok(Records::new(usage_header(), rows))
}

fn timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|_| raw.to_string())
}
