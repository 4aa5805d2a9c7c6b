//! The provider → resource → metric reference chain.

use finops_control::{ControlPlane, ControlResult, fetch_required};
use finops_core::{
    Kind, MetricConfig, MetricConfigSpec, ObjectRef, ProviderConfig, ResourceConfig,
};
use tracing::debug;

/// A resource config with its metric configs resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceMetrics {
    pub focus_name: String,
    pub metrics: Vec<MetricConfigSpec>,
}

/// Snapshot of the chain for one cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceChain {
    pub resources: Vec<ResourceMetrics>,
}

impl ReferenceChain {
    /// Walk provider → resources → metrics. A reference without a
    /// namespace inherits its parent's.
    pub async fn fetch(control: &dyn ControlPlane, provider: &ObjectRef) -> ControlResult<Self> {
        let provider_config: ProviderConfig =
            fetch_required(control, Kind::ProviderConfig, &provider.namespace, &provider.name)
                .await?;
        debug!(provider = %provider.name, resources = provider_config.spec.resources_ref.len(), "provider config loaded");

        let mut resources = Vec::with_capacity(provider_config.spec.resources_ref.len());
        for resource_ref in &provider_config.spec.resources_ref {
            let namespace = namespace_or(resource_ref, &provider.namespace);
            let resource: ResourceConfig =
                fetch_required(control, Kind::ResourceConfig, namespace, &resource_ref.name)
                    .await?;

            let mut metrics = Vec::with_capacity(resource.spec.metrics_ref.len());
            for metric_ref in &resource.spec.metrics_ref {
                let namespace = namespace_or(metric_ref, namespace);
                let metric: MetricConfig =
                    fetch_required(control, Kind::MetricConfig, namespace, &metric_ref.name)
                        .await?;
                debug!(
                    metric = %metric.spec.metric_name,
                    interval = %metric.spec.interval,
                    timespan = %metric.spec.timespan,
                    "metric config loaded"
                );
                metrics.push(metric.spec);
            }

            debug!(resource = %resource.spec.resource_focus_name, metrics = metrics.len(), "resource config loaded");
            resources.push(ResourceMetrics {
                focus_name: resource.spec.resource_focus_name,
                metrics,
            });
        }
        Ok(Self { resources })
    }

    /// Whether any resource config targets `resource_type`.
    pub fn covers(&self, resource_type: &str) -> bool {
        self.resources
            .iter()
            .any(|r| r.focus_name.eq_ignore_ascii_case(resource_type))
    }

    /// All metric configs for `resource_type`, across every matching
    /// resource config, in chain order.
    pub fn metrics_for<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = &'a MetricConfigSpec> + 'a {
        self.resources
            .iter()
            .filter(move |r| r.focus_name.eq_ignore_ascii_case(resource_type))
            .flat_map(|r| r.metrics.iter())
    }
}

fn namespace_or<'a>(reference: &'a ObjectRef, fallback: &'a str) -> &'a str {
    if reference.namespace.is_empty() {
        fallback
    } else {
        &reference.namespace
    }
}
