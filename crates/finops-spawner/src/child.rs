//! Child `ExporterScraperConfig` construction.

use chrono::NaiveDate;
use finops_core::{
    EXPORTER_KIND, ExporterConfig, ExporterScraperConfig, ExporterScraperConfigSpec,
    FINOPS_API_VERSION, MetricConfigSpec, MetricType, ObjectMeta, OwnerReference, ScraperConfig,
};

use crate::discovery::DiscoveredResource;
use crate::timespan::{compute_timespan, format_suffix, query_escape};

/// Suffix appended to the parent's table name for resource children.
pub const RESOURCE_TABLE_SUFFIX: &str = "_res";

/// Variable carrying the resource id into the child's substitutions.
pub const RESOURCE_ID_VARIABLE: &str = "ResourceId";

/// `exporterscraperconfig-{provider}-res{i}` for a resource's first
/// metric, `…-res{i}-{j}` for the others. A trailing `-exporter` on the
/// provider name is dropped.
pub fn child_name(provider_name: &str, resource_index: usize, metric_index: usize) -> String {
    let provider = provider_name
        .strip_suffix("-exporter")
        .unwrap_or(provider_name);
    if metric_index == 0 {
        format!("exporterscraperconfig-{provider}-res{resource_index}")
    } else {
        format!("exporterscraperconfig-{provider}-res{resource_index}-{metric_index}")
    }
}

/// Where a child sits: resource position in the discovered set and
/// metric position among the resource's metric configs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildSlot {
    pub resource_index: usize,
    pub metric_index: usize,
}

/// Derive the child config for one (resource, metric) pair.
pub fn build_child(
    parent: &ExporterScraperConfig,
    provider_name: &str,
    resource: &DiscoveredResource,
    metric: &MetricConfigSpec,
    slot: ChildSlot,
    today: NaiveDate,
) -> ExporterScraperConfig {
    let exporter = parent.exporter();

    let mut api = metric
        .endpoint
        .resource_prefix_api
        .clone()
        .unwrap_or_else(|| exporter.api.clone());
    let suffix = format_suffix(
        &metric.endpoint.resource_suffix,
        &[
            query_escape(&metric.metric_name).as_str(),
            compute_timespan(&metric.timespan, today).as_str(),
            metric.interval.as_str(),
        ],
    );
    api.path = format!("{}{suffix}", resource.resource_id);

    let mut additional_variables = exporter.additional_variables.clone();
    additional_variables.insert(
        RESOURCE_ID_VARIABLE.to_string(),
        resource.resource_id.clone(),
    );

    let scraper = &parent.spec.scraper_config;
    ExporterScraperConfig {
        api_version: FINOPS_API_VERSION.to_string(),
        kind: EXPORTER_KIND.to_string(),
        metadata: ObjectMeta {
            name: child_name(provider_name, slot.resource_index, slot.metric_index),
            namespace: parent.metadata.namespace.clone(),
            uid: None,
            owner_references: vec![OwnerReference {
                api_version: FINOPS_API_VERSION.to_string(),
                kind: EXPORTER_KIND.to_string(),
                name: parent.metadata.name.clone(),
                uid: parent.metadata.uid.clone(),
            }],
        },
        spec: ExporterScraperConfigSpec {
            exporter_config: ExporterConfig {
                provider: exporter.provider.clone(),
                api,
                metric_type: MetricType::Resource,
                polling_interval: exporter.polling_interval,
                additional_variables,
            },
            scraper_config: ScraperConfig {
                table_name: format!("{}{RESOURCE_TABLE_SUFFIX}", scraper.table_name),
                metric_type: Some(MetricType::Resource),
                polling_interval: scraper.polling_interval,
                scraper_database_config_ref: scraper.scraper_database_config_ref.clone(),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finops_core::{Api, MetricEndpoint, ObjectRef};

    const PARENT: &str = r#"
apiVersion: finops.krateo.io/v1
kind: ExporterScraperConfig
metadata:
  name: azure-exporter
  namespace: finops
  uid: 0a1b-2c3d
spec:
  exporterConfig:
    provider:
      name: azure-exporter
      namespace: finops
    api:
      path: /providers/Microsoft.CostManagement/generateCostDetailsReport
      verb: POST
      endpointRef:
        name: azure-endpoint
        namespace: finops
    metricType: cost
    pollingInterval: 1h
    additionalVariables:
      subscription_id: sub-1
  scraperConfig:
    tableName: azure_costs
    pollingInterval: 1h
    scraperDatabaseConfigRef:
      name: db
      namespace: finops
"#;

    fn vm() -> DiscoveredResource {
        DiscoveredResource {
            resource_id: "/subscriptions/sub-1/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/vm-1".into(),
            resource_type: "Virtual machine".into(),
        }
    }

    fn cpu_metric(prefix: Option<Api>) -> MetricConfigSpec {
        MetricConfigSpec {
            metric_name: "Percentage CPU".into(),
            endpoint: MetricEndpoint {
                resource_prefix_api: prefix,
                resource_suffix:
                    "/providers/microsoft.insights/metrics?api-version=2023-10-01&metricnames=%s&timespan=%s&interval=%s"
                        .into(),
            },
            interval: "PT15M".into(),
            timespan: "day".into(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    #[test]
    fn names() {
        assert_eq!(child_name("azure-exporter", 0, 0), "exporterscraperconfig-azure-res0");
        assert_eq!(child_name("azure-exporter", 3, 2), "exporterscraperconfig-azure-res3-2");
        assert_eq!(child_name("gcp", 1, 0), "exporterscraperconfig-gcp-res1");
    }

    #[test]
    fn child_inherits_parent_api_and_settings() {
        let parent = ExporterScraperConfig::from_yaml(PARENT).unwrap();
        let slot = ChildSlot {
            resource_index: 0,
            metric_index: 0,
        };
        let child = build_child(&parent, "azure-exporter", &vm(), &cpu_metric(None), slot, today());

        assert_eq!(child.metadata.name, "exporterscraperconfig-azure-res0");
        assert_eq!(child.metadata.namespace, "finops");
        assert_eq!(child.metadata.owner_references.len(), 1);
        let owner = &child.metadata.owner_references[0];
        assert_eq!(owner.kind, "ExporterScraperConfig");
        assert_eq!(owner.name, "azure-exporter");
        assert_eq!(owner.uid.as_deref(), Some("0a1b-2c3d"));

        let exporter = child.exporter();
        assert_eq!(exporter.metric_type, MetricType::Resource);
        assert_eq!(exporter.api.verb, "POST");
        assert_eq!(exporter.api.endpoint_ref.as_ref().unwrap().name, "azure-endpoint");
        assert_eq!(
            exporter.api.path,
            "/subscriptions/sub-1/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/vm-1\
             /providers/microsoft.insights/metrics?api-version=2023-10-01\
             &metricnames=Percentage+CPU&timespan=2024-03-09/2024-03-10&interval=PT15M"
        );
        assert_eq!(exporter.additional_variables["subscription_id"], "sub-1");
        assert_eq!(exporter.additional_variables["ResourceId"], vm().resource_id);
        assert_eq!(exporter.provider, parent.exporter().provider);
        assert_eq!(exporter.polling_interval, parent.exporter().polling_interval);

        let scraper = &child.spec.scraper_config;
        assert_eq!(scraper.table_name, "azure_costs_res");
        assert_eq!(scraper.metric_type, Some(MetricType::Resource));
        assert_eq!(scraper.scraper_database_config_ref.name, "db");
    }

    #[test]
    fn prefix_api_replaces_parent_api() {
        let parent = ExporterScraperConfig::from_yaml(PARENT).unwrap();
        let prefix = Api {
            name: None,
            path: String::new(),
            verb: "GET".into(),
            headers: Vec::new(),
            payload: None,
            endpoint_ref: Some(ObjectRef {
                name: "monitor-endpoint".into(),
                namespace: "finops".into(),
            }),
        };
        let slot = ChildSlot {
            resource_index: 2,
            metric_index: 1,
        };
        let child = build_child(&parent, "azure-exporter", &vm(), &cpu_metric(Some(prefix)), slot, today());
        assert_eq!(child.metadata.name, "exporterscraperconfig-azure-res2-1");
        assert_eq!(child.exporter().api.verb, "GET");
        assert_eq!(
            child.exporter().api.endpoint_ref.as_ref().unwrap().name,
            "monitor-endpoint"
        );
    }

    #[test]
    fn child_serializes_with_camel_case_fields() {
        let parent = ExporterScraperConfig::from_yaml(PARENT).unwrap();
        let slot = ChildSlot {
            resource_index: 0,
            metric_index: 0,
        };
        let child = build_child(&parent, "azure-exporter", &vm(), &cpu_metric(None), slot, today());
        let json = serde_json::to_value(&child).unwrap();
        assert_eq!(json["metadata"]["ownerReferences"][0]["apiVersion"], "finops.krateo.io/v1");
        assert_eq!(json["spec"]["exporterConfig"]["metricType"], "resource");
        assert_eq!(json["spec"]["scraperConfig"]["tableName"], "azure_costs_res");
    }
}
