//! Spawner against the in-memory control plane.

use std::sync::Arc;

use chrono::NaiveDate;
use finops_control::{ControlPlane, InMemoryControlPlane};
use finops_core::{ExporterScraperConfig, Kind};
use finops_spawner::{ResourceSpawner, SpawnError};
use finops_table::Records;
use serde_json::json;

const PARENT: &str = r#"
metadata:
  name: azure-exporter
  namespace: finops
  uid: parent-uid
spec:
  exporterConfig:
    provider:
      name: azure-exporter
      namespace: finops
    api:
      path: /costs
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

async fn seeded() -> InMemoryControlPlane {
    let control = InMemoryControlPlane::new();
    control
        .insert(
            Kind::ProviderConfig,
            "finops",
            "azure-exporter",
            json!({ "spec": { "resourcesRef": [{ "name": "vm", "namespace": "" }] } }),
        )
        .await;
    control
        .insert(
            Kind::ResourceConfig,
            "finops",
            "vm",
            json!({ "spec": {
                "resourceFocusName": "Virtual machine",
                "metricsRef": [{ "name": "cpu" }, { "name": "net" }]
            } }),
        )
        .await;
    for (name, metric) in [("cpu", "Percentage CPU"), ("net", "Network In")] {
        control
            .insert(
                Kind::MetricConfig,
                "finops",
                name,
                json!({ "spec": {
                    "metricName": metric,
                    "endpoint": {
                        "resourceSuffix": "/metrics?metricnames=%s&timespan=%s&interval=%s"
                    },
                    "interval": "PT15M",
                    "timespan": "month"
                } }),
            )
            .await;
    }
    control
}

fn cost_rows(rows: &[(&str, &str)]) -> Records {
    Records::new(
        vec![
            "BilledCost".into(),
            "ResourceId".into(),
            "ResourceType".into(),
        ],
        rows.iter()
            .map(|(id, kind)| vec!["1.0".to_string(), id.to_string(), kind.to_string()])
            .collect(),
    )
}

fn spawner(control: &InMemoryControlPlane) -> ResourceSpawner {
    let today = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
    ResourceSpawner::with_clock(Arc::new(control.clone()), Arc::new(move || today))
}

async fn child(control: &InMemoryControlPlane, name: &str) -> ExporterScraperConfig {
    let value = control
        .get(Kind::ExporterScraperConfig, "finops", name)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("{name} not created"));
    serde_json::from_value(value).unwrap()
}

#[tokio::test]
async fn creates_one_child_per_resource_metric_pair() {
    let control = seeded().await;
    let parent = ExporterScraperConfig::from_yaml(PARENT).unwrap();
    let mut spawner = spawner(&control);

    let records = cost_rows(&[
        ("/vms/vm-1", "Virtual machine"),
        ("/disks/d-1", "Disk"),
        ("/vms/vm-2", "virtual machine"),
    ]);
    let report = spawner.discover_and_spawn(&records, &parent).await.unwrap();

    assert_eq!(report.discovered, 2);
    assert_eq!(report.created, 4);
    assert_eq!(report.failed, 0);
    assert_eq!(
        control.names(Kind::ExporterScraperConfig, "finops").await,
        vec![
            "exporterscraperconfig-azure-res0",
            "exporterscraperconfig-azure-res0-1",
            "exporterscraperconfig-azure-res1",
            "exporterscraperconfig-azure-res1-1",
        ]
    );

    let net = child(&control, "exporterscraperconfig-azure-res1-1").await;
    assert_eq!(
        net.exporter().api.path,
        "/vms/vm-2/metrics?metricnames=Network+In&timespan=2024-02-29/2024-03-31&interval=PT15M"
    );
    assert_eq!(net.exporter().additional_variables["ResourceId"], "/vms/vm-2");
    assert_eq!(net.spec.scraper_config.table_name, "azure_costs_res");
    assert_eq!(net.metadata.owner_references[0].uid.as_deref(), Some("parent-uid"));
}

#[tokio::test]
async fn repeated_passes_create_at_most_once() {
    let control = seeded().await;
    let parent = ExporterScraperConfig::from_yaml(PARENT).unwrap();
    let mut spawner = spawner(&control);
    let records = cost_rows(&[("/vms/vm-1", "Virtual machine")]);

    let first = spawner.discover_and_spawn(&records, &parent).await.unwrap();
    let second = spawner.discover_and_spawn(&records, &parent).await.unwrap();

    assert_eq!(first.created, 2);
    assert_eq!(second.discovered, 0);
    assert_eq!(second.created, 0);
    assert_eq!(second.skipped, 2);
    assert_eq!(control.create_count(), 2);
}

#[tokio::test]
async fn resources_keep_their_index_across_passes() {
    let control = seeded().await;
    let parent = ExporterScraperConfig::from_yaml(PARENT).unwrap();
    let mut spawner = spawner(&control);

    spawner
        .discover_and_spawn(&cost_rows(&[("/vms/vm-1", "Virtual machine")]), &parent)
        .await
        .unwrap();
    // vm-1 disappears from the batch; vm-2 must not take its slot.
    let report = spawner
        .discover_and_spawn(&cost_rows(&[("/vms/vm-2", "Virtual machine")]), &parent)
        .await
        .unwrap();

    assert_eq!(report.created, 2);
    let second = child(&control, "exporterscraperconfig-azure-res1").await;
    assert_eq!(second.exporter().additional_variables["ResourceId"], "/vms/vm-2");
    assert_eq!(spawner.discovered().len(), 2);
}

#[tokio::test]
async fn existing_children_are_not_touched() {
    let control = seeded().await;
    control
        .insert(
            Kind::ExporterScraperConfig,
            "finops",
            "exporterscraperconfig-azure-res0",
            json!({ "metadata": { "name": "exporterscraperconfig-azure-res0" }, "custom": true }),
        )
        .await;
    let parent = ExporterScraperConfig::from_yaml(PARENT).unwrap();
    let mut spawner = spawner(&control);

    let report = spawner
        .discover_and_spawn(&cost_rows(&[("/vms/vm-1", "Virtual machine")]), &parent)
        .await
        .unwrap();

    assert_eq!(report.created, 1);
    assert_eq!(report.skipped, 1);
    let kept = control
        .get(Kind::ExporterScraperConfig, "finops", "exporterscraperconfig-azure-res0")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(kept["custom"], true);
}

#[tokio::test]
async fn missing_provider_config_is_an_error() {
    let control = InMemoryControlPlane::new();
    let parent = ExporterScraperConfig::from_yaml(PARENT).unwrap();
    let mut spawner = spawner(&control);

    let err = spawner
        .discover_and_spawn(&cost_rows(&[("/vms/vm-1", "Virtual machine")]), &parent)
        .await
        .unwrap_err();
    assert!(matches!(err, SpawnError::Chain(_)));
    assert!(spawner.discovered().is_empty());
}

#[tokio::test]
async fn unavailable_control_plane_is_an_error() {
    let control = seeded().await;
    control.set_unavailable(true);
    let parent = ExporterScraperConfig::from_yaml(PARENT).unwrap();
    let mut spawner = spawner(&control);

    let result = spawner
        .discover_and_spawn(&cost_rows(&[("/vms/vm-1", "Virtual machine")]), &parent)
        .await;
    assert!(matches!(result, Err(SpawnError::Chain(_))));
    assert_eq!(control.create_count(), 0);
}

#[tokio::test]
async fn exporter_without_provider_is_rejected() {
    let control = seeded().await;
    let mut parent = ExporterScraperConfig::from_yaml(PARENT).unwrap();
    parent.spec.exporter_config.provider = None;
    let mut spawner = spawner(&control);

    let result = spawner.discover_and_spawn(&Records::default(), &parent).await;
    assert!(matches!(result, Err(SpawnError::MissingProvider)));
}
