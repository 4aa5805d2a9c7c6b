//! finops-table: turns fetched payloads into a header plus rows.
//!
//! ```text
//!   bytes ─▶ strip BOM ─┬─ text/csv ─────────────────▶ parse_rows ──┐
//!                       ├─ application/json + cost ──▶ parse_focus ─┼─▶ Records
//!                       └─ application/json + resource ▶ parse_usage┘
//! ```
//!
//! Also hosts the label derivation shared by the reconciler and the
//! spawner ([`LabelSet`], tag sanitizing, internal-column filtering).

pub mod delimited;
pub mod error;
pub mod focus;
pub mod labels;
pub mod records;
pub mod usage;

use finops_core::{ContentType, MetricType};
use tracing::debug;

pub use error::{NormalizeError, NormalizeResult};
pub use focus::FOCUS_COLUMNS;
pub use labels::{LabelSet, is_internal_column, is_tag_column, sanitize_tags};
pub use records::{Records, Row};
pub use usage::{USAGE_HEADER, USAGE_VALUE_INDEX};

/// Normalize a payload according to its content type and the exporter's
/// metric type. `resource_id` tags usage rows in resource mode.
pub fn normalize(
    body: &[u8],
    content_type: &ContentType,
    metric_type: MetricType,
    resource_id: &str,
) -> NormalizeResult<Records> {
    let body = delimited::strip_bom(body);
    let records = match (content_type, metric_type) {
        (ContentType::Csv, _) => Records::from_rows(delimited::parse_rows(body)?),
        (ContentType::Json, MetricType::Cost) => focus::parse_focus(body)?,
        (ContentType::Json, MetricType::Resource) => usage::parse_usage(body, resource_id)?,
        (ContentType::Other(other), _) => {
            return Err(NormalizeError::UnsupportedContentType(other.clone()));
        }
    };
    debug!(
        %content_type,
        %metric_type,
        rows = records.len(),
        columns = records.header().len(),
        "payload normalized"
    );
    Ok(records)
}
