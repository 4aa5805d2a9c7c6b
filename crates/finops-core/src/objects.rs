//! Control-plane object kinds and the provider → resource → metric
//! reference chain.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{Api, ObjectRef};

/// Object kinds the exporter reads from or writes to the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    ExporterScraperConfig,
    ProviderConfig,
    ResourceConfig,
    MetricConfig,
    Secret,
}

impl Kind {
    pub fn name(&self) -> &'static str {
        match self {
            Kind::ExporterScraperConfig => "ExporterScraperConfig",
            Kind::ProviderConfig => "ProviderConfig",
            Kind::ResourceConfig => "ResourceConfig",
            Kind::MetricConfig => "MetricConfig",
            Kind::Secret => "Secret",
        }
    }

    /// API group; empty for core objects.
    pub fn group(&self) -> &'static str {
        match self {
            Kind::Secret => "",
            _ => "finops.krateo.io",
        }
    }

    pub fn version(&self) -> &'static str {
        "v1"
    }

    /// Lower-case plural resource name used in REST paths.
    pub fn plural(&self) -> &'static str {
        match self {
            Kind::ExporterScraperConfig => "exporterscraperconfigs",
            Kind::ProviderConfig => "providerconfigs",
            Kind::ResourceConfig => "resourceconfigs",
            Kind::MetricConfig => "metricconfigs",
            Kind::Secret => "secrets",
        }
    }

    /// `group/version`, or just `version` for core objects.
    pub fn api_version(&self) -> String {
        match self.group() {
            "" => self.version().to_string(),
            group => format!("{group}/{}", self.version()),
        }
    }

    /// REST collection path, e.g.
    /// `/apis/finops.krateo.io/v1/namespaces/finops/providerconfigs`.
    pub fn collection_path(&self, namespace: &str) -> String {
        match self.group() {
            "" => format!(
                "/api/{}/namespaces/{namespace}/{}",
                self.version(),
                self.plural()
            ),
            group => format!(
                "/apis/{group}/{}/namespaces/{namespace}/{}",
                self.version(),
                self.plural()
            ),
        }
    }

    pub fn object_path(&self, namespace: &str, name: &str) -> String {
        format!("{}/{name}", self.collection_path(namespace))
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProviderConfig {
    #[serde(default)]
    pub spec: ProviderConfigSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigSpec {
    #[serde(default)]
    pub resources_ref: Vec<ObjectRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResourceConfig {
    #[serde(default)]
    pub spec: ResourceConfigSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceConfigSpec {
    /// Value of the `ResourceType` column this config applies to.
    #[serde(default)]
    pub resource_focus_name: String,
    #[serde(default)]
    pub metrics_ref: Vec<ObjectRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetricConfig {
    #[serde(default)]
    pub spec: MetricConfigSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricConfigSpec {
    #[serde(default)]
    pub metric_name: String,
    #[serde(default)]
    pub endpoint: MetricEndpoint,
    #[serde(default)]
    pub interval: String,
    #[serde(default)]
    pub timespan: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetricEndpoint {
    /// Replaces the parent API for children of this metric when set.
    #[serde(
        rename = "resourcePrefixAPI",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub resource_prefix_api: Option<Api>,
    /// Path template appended to the resource id; `%s` placeholders take
    /// the metric name, timespan and interval in that order.
    #[serde(rename = "resourceSuffix", default)]
    pub resource_suffix: String,
}
