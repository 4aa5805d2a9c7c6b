//! FOCUS cost list (JSON) → rows.
//!
//! The payload is a list object whose items carry one FOCUS record each
//! under `spec.focusSpec`. Columns are projected through [`FOCUS_COLUMNS`],
//! so the header is fixed and independent of which fields a record sets.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::error::NormalizeResult;
use crate::records::{Records, Row};

/// How a FOCUS field is rendered into a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Text,
    /// Monetary amounts and quantities, rendered as canonical decimals.
    Quantity,
    /// RFC 3339 in UTC.
    Timestamp,
    /// `[{key, value}]` rendered as `key=value;key=value`.
    Tags,
}

/// Column name, JSON field, rendering. Order defines the header.
pub const FOCUS_COLUMNS: &[(&str, &str, Cell)] = &[
    ("AvailabilityZone", "availabilityZone", Cell::Text),
    ("BilledCost", "billedCost", Cell::Quantity),
    ("BillingAccountId", "billingAccountId", Cell::Text),
    ("BillingAccountName", "billingAccountName", Cell::Text),
    ("BillingCurrency", "billingCurrency", Cell::Text),
    ("BillingPeriodEnd", "billingPeriodEnd", Cell::Timestamp),
    ("BillingPeriodStart", "billingPeriodStart", Cell::Timestamp),
    ("ChargeCategory", "chargeCategory", Cell::Text),
    ("ChargeClass", "chargeClass", Cell::Text),
    ("ChargeDescription", "chargeDescription", Cell::Text),
    ("ChargeFrequency", "chargeFrequency", Cell::Text),
    ("ChargePeriodEnd", "chargePeriodEnd", Cell::Timestamp),
    ("ChargePeriodStart", "chargePeriodStart", Cell::Timestamp),
    ("CommitmentDiscountCategory", "commitmentDiscountCategory", Cell::Text),
    ("CommitmentDiscountId", "commitmentDiscountId", Cell::Text),
    ("CommitmentDiscountName", "commitmentDiscountName", Cell::Text),
    ("CommitmentDiscountStatus", "commitmentDiscountStatus", Cell::Text),
    ("CommitmentDiscountType", "commitmentDiscountType", Cell::Text),
    ("ConsumedQuantity", "consumedQuantity", Cell::Quantity),
    ("ConsumedUnit", "consumedUnit", Cell::Text),
    ("ContractedCost", "contractedCost", Cell::Quantity),
    ("ContractedUnitPrice", "contractedUnitPrice", Cell::Quantity),
    ("EffectiveCost", "effectiveCost", Cell::Quantity),
    ("InvoiceIssuerName", "invoiceIssuerName", Cell::Text),
    ("ListCost", "listCost", Cell::Quantity),
    ("ListUnitPrice", "listUnitPrice", Cell::Quantity),
    ("PricingCategory", "pricingCategory", Cell::Text),
    ("PricingQuantity", "pricingQuantity", Cell::Quantity),
    ("PricingUnit", "pricingUnit", Cell::Text),
    ("ProviderName", "providerName", Cell::Text),
    ("PublisherName", "publisherName", Cell::Text),
    ("RegionId", "regionId", Cell::Text),
    ("RegionName", "regionName", Cell::Text),
    ("ResourceId", "resourceId", Cell::Text),
    ("ResourceName", "resourceName", Cell::Text),
    ("ResourceType", "resourceType", Cell::Text),
    ("ServiceCategory", "serviceCategory", Cell::Text),
    ("ServiceName", "serviceName", Cell::Text),
    ("SkuId", "skuId", Cell::Text),
    ("SkuPriceId", "skuPriceId", Cell::Text),
    ("SubAccountId", "subAccountId", Cell::Text),
    ("SubAccountName", "subAccountName", Cell::Text),
    ("Tags", "tags", Cell::Tags),
];

#[derive(Debug, Deserialize)]
struct FocusList {
    #[serde(default)]
    items: Vec<FocusItem>,
}

#[derive(Debug, Deserialize)]
struct FocusItem {
    #[serde(default)]
    spec: FocusItemSpec,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FocusItemSpec {
    #[serde(default)]
    focus_spec: serde_json::Map<String, Value>,
}

pub fn focus_header() -> Row {
    FOCUS_COLUMNS
        .iter()
        .map(|(column, _, _)| column.to_string())
        .collect()
}

/// Decode a FOCUS list. An empty list yields an empty batch.
pub fn parse_focus(data: &[u8]) -> NormalizeResult<Records> {
    let list: FocusList = serde_json::from_slice(data)?;
    if list.items.is_empty() {
        return Ok(Records::default());
    }
    let rows = list
        .items
        .iter()
        .map(|item| {
            FOCUS_COLUMNS
                .iter()
                .map(|(_, field, cell)| render(item.spec.focus_spec.get(*field), *cell))
                .collect()
        })
        .collect();
    Ok(Records::new(focus_header(), rows))
}

fn render(value: Option<&Value>, cell: Cell) -> String {
    let Some(value) = value else {
        return String::new();
    };
    match cell {
        Cell::Text => scalar(value),
        Cell::Quantity => canonical_decimal(&scalar(value)),
        Cell::Timestamp => {
            let raw = scalar(value);
            match DateTime::parse_from_rfc3339(&raw) {
                Ok(ts) => ts
                    .with_timezone(&Utc)
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
                Err(_) => raw,
            }
        }
        Cell::Tags => tags(value),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// `"12.50"` → `"12.5"`, `"1e3"` → `"1000"`. Values that are not plain
/// decimals pass through unchanged.
pub fn canonical_decimal(raw: &str) -> String {
    let trimmed = raw.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map(|d| d.normalize().to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn tags(value: &Value) -> String {
    let Some(entries) = value.as_array() else {
        return scalar(value);
    };
    entries
        .iter()
        .map(|tag| {
            let key = tag.get("key").map(scalar).unwrap_or_default();
            let value = tag.get("value").map(scalar).unwrap_or_default();
            format!("{key}={value}")
        })
        .collect::<Vec<_>>()
        .join(";")
}
