//! Mark-and-sweep reconciliation of a batch into the gauge registry.

use finops_core::MetricType;
use finops_table::{LabelSet, Records, USAGE_VALUE_INDEX};
use prometheus::{Gauge, Opts};
use tracing::{debug, info, warn};

use crate::error::ReconcileError;
use crate::identity::SeriesIdentity;
use crate::registry::{GaugeEntry, GaugeRegistry};

/// Series name used for every cost row.
pub const COST_SERIES: &str = "billed_cost";

/// Header column holding the value in cost mode.
pub const COST_VALUE_COLUMN: &str = "BilledCost";

/// Column holding the metric name in resource mode.
const RESOURCE_NAME_INDEX: usize = 1;

/// Outcome of one reconcile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    pub skipped: usize,
}

pub struct GaugeReconciler {
    registry: GaugeRegistry,
    metric_type: MetricType,
}

impl GaugeReconciler {
    pub fn new(registry: GaugeRegistry, metric_type: MetricType) -> Self {
        Self {
            registry,
            metric_type,
        }
    }

    pub fn registry(&self) -> &GaugeRegistry {
        &self.registry
    }

    /// Apply one batch: update seen series, create new ones, then remove
    /// every series the batch did not mention.
    pub async fn reconcile(&self, records: &Records) -> Result<ReconcileReport, ReconcileError> {
        let header = records.header();
        let value_index = self.value_index(records)?;
        let mut report = ReconcileReport::default();

        let mut guard = self.registry.write().await;
        let inner = &mut *guard;

        for (line, row) in records.rows().iter().enumerate() {
            if row.len() != header.len() {
                warn!(
                    line,
                    cells = row.len(),
                    columns = header.len(),
                    "row length differs from header, skipping"
                );
                report.skipped += 1;
                continue;
            }

            let labels = LabelSet::from_row(header, row, value_index);
            let name = self.series_name(row);
            let identity = SeriesIdentity::new(&name, &labels);
            let raw = row[value_index].trim();

            if let Some(entry) = inner.entries.get_mut(&identity) {
                entry.seen = true;
                match raw.parse::<f64>() {
                    Ok(value) => {
                        entry.gauge.set(value);
                        report.updated += 1;
                    }
                    Err(e) => {
                        warn!(line, %identity, value = raw, error = %e, "unparseable value, keeping previous");
                        report.skipped += 1;
                    }
                }
                continue;
            }

            let value = match raw.parse::<f64>() {
                Ok(value) => value,
                Err(e) => {
                    warn!(line, %identity, value = raw, error = %e, "unparseable value, skipping row");
                    report.skipped += 1;
                    continue;
                }
            };

            let gauge = match self.new_gauge(&name, &labels) {
                Ok(gauge) => gauge,
                Err(e) => {
                    warn!(line, %identity, error = %e, "cannot build gauge, skipping row");
                    report.skipped += 1;
                    continue;
                }
            };
            gauge.set(value);
            if let Err(e) = inner.registry.register(Box::new(gauge.clone())) {
                warn!(line, %identity, error = %e, "cannot register gauge, skipping row");
                report.skipped += 1;
                continue;
            }
            inner.entries.insert(
                identity,
                GaugeEntry {
                    name,
                    labels,
                    gauge,
                    seen: true,
                },
            );
            report.created += 1;
        }

        let registry = &inner.registry;
        inner.entries.retain(|identity, entry| {
            if entry.seen {
                entry.seen = false;
                return true;
            }
            if let Err(e) = registry.unregister(Box::new(entry.gauge.clone())) {
                warn!(%identity, error = %e, "unregister failed");
            }
            debug!(%identity, "series removed");
            report.removed += 1;
            false
        });

        info!(
            rows = records.len(),
            created = report.created,
            updated = report.updated,
            removed = report.removed,
            skipped = report.skipped,
            series = inner.entries.len(),
            "reconcile complete"
        );
        Ok(report)
    }

    fn value_index(&self, records: &Records) -> Result<usize, ReconcileError> {
        match self.metric_type {
            MetricType::Cost => records
                .index_of(COST_VALUE_COLUMN)
                .ok_or_else(|| ReconcileError::MissingColumn(COST_VALUE_COLUMN.to_string())),
            MetricType::Resource => {
                if records.header().len() > USAGE_VALUE_INDEX {
                    Ok(USAGE_VALUE_INDEX)
                } else {
                    Err(ReconcileError::MissingColumn("average".to_string()))
                }
            }
        }
    }

    fn series_name(&self, row: &[String]) -> String {
        match self.metric_type {
            MetricType::Cost => COST_SERIES.to_string(),
            MetricType::Resource => row[RESOURCE_NAME_INDEX].to_lowercase().replace(' ', "_"),
        }
    }

    fn new_gauge(&self, name: &str, labels: &LabelSet) -> prometheus::Result<Gauge> {
        let help = match self.metric_type {
            MetricType::Cost => "Billed cost reported by the billing API",
            MetricType::Resource => "Resource usage reported by the metrics API",
        };
        let const_labels = labels.as_map().clone().into_iter().collect();
        Gauge::with_opts(Opts::new(name, help).const_labels(const_labels))
    }
}
