//! ResourceSpawner: discovery plus at-most-once child creation.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use finops_control::ControlPlane;
use finops_core::{ExporterScraperConfig, Kind};
use finops_table::Records;
use tracing::{debug, info, warn};

use crate::chain::ReferenceChain;
use crate::child::{ChildSlot, build_child};
use crate::discovery::DiscoveredResources;
use crate::error::SpawnError;

/// Source of "today" for timespan computation.
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Outcome of one spawn pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpawnReport {
    /// Resources newly added to the discovered set.
    pub discovered: usize,
    pub created: usize,
    /// Children already present, or whose lookup failed.
    pub skipped: usize,
    pub failed: usize,
}

pub struct ResourceSpawner {
    control: Arc<dyn ControlPlane>,
    discovered: DiscoveredResources,
    clock: Clock,
}

impl ResourceSpawner {
    pub fn new(control: Arc<dyn ControlPlane>) -> Self {
        Self::with_clock(control, Arc::new(|| Utc::now().date_naive()))
    }

    pub fn with_clock(control: Arc<dyn ControlPlane>, clock: Clock) -> Self {
        Self {
            control,
            discovered: DiscoveredResources::new(),
            clock,
        }
    }

    pub fn discovered(&self) -> &DiscoveredResources {
        &self.discovered
    }

    /// Record resources seen in `records` and make sure every
    /// (resource, metric) child of `parent` exists.
    ///
    /// Existing children are left untouched. A failed create is counted
    /// and the pass moves on; only a broken reference chain aborts.
    pub async fn discover_and_spawn(
        &mut self,
        records: &Records,
        parent: &ExporterScraperConfig,
    ) -> Result<SpawnReport, SpawnError> {
        let provider = parent
            .exporter()
            .provider()
            .ok_or(SpawnError::MissingProvider)?;
        let chain = ReferenceChain::fetch(self.control.as_ref(), provider).await?;

        let mut report = SpawnReport {
            discovered: self.discovered.observe(records, &chain),
            ..SpawnReport::default()
        };
        let today = (self.clock)();
        let namespace = parent.metadata.namespace.as_str();

        for (resource_index, resource) in self.discovered.iter().enumerate() {
            for (metric_index, metric) in chain.metrics_for(&resource.resource_type).enumerate() {
                let slot = ChildSlot {
                    resource_index,
                    metric_index,
                };
                let child = build_child(parent, &provider.name, resource, metric, slot, today);
                let name = child.metadata.name.as_str();

                match self
                    .control
                    .get(Kind::ExporterScraperConfig, namespace, name)
                    .await
                {
                    Ok(None) => {}
                    Ok(Some(_)) => {
                        debug!(child = name, "child exists");
                        report.skipped += 1;
                        continue;
                    }
                    Err(e) => {
                        warn!(child = name, error = %e, "child lookup failed, skipping");
                        report.skipped += 1;
                        continue;
                    }
                }

                let object = serde_json::to_value(&child)?;
                match self
                    .control
                    .create(Kind::ExporterScraperConfig, namespace, object)
                    .await
                {
                    Ok(_) => {
                        info!(
                            child = name,
                            resource_id = %resource.resource_id,
                            metric = %metric.metric_name,
                            "child exporter created"
                        );
                        report.created += 1;
                    }
                    Err(e) => {
                        warn!(child = name, error = %e, "child exporter creation failed");
                        report.failed += 1;
                    }
                }
            }
        }

        debug!(
            discovered = report.discovered,
            created = report.created,
            skipped = report.skipped,
            failed = report.failed,
            known = self.discovered.len(),
            "spawn pass complete"
        );
        Ok(report)
    }
}
