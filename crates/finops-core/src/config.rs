//! Exporter configuration (`ExporterScraperConfig`) and its YAML loader.
//!
//! The same document shape is used for the exporter's own config file and
//! for the child configs the spawner creates in the control plane, so
//! every type here round-trips through both YAML and JSON.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::duration::PollingInterval;
use crate::error::{ConfigError, ConfigResult};

/// API group/version of every FinOps object.
pub const FINOPS_API_VERSION: &str = "finops.krateo.io/v1";

/// Kind name of the exporter config object.
pub const EXPORTER_KIND: &str = "ExporterScraperConfig";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExporterScraperConfig {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    pub spec: ExporterScraperConfigSpec,
}

fn default_api_version() -> String {
    FINOPS_API_VERSION.to_string()
}

fn default_kind() -> String {
    EXPORTER_KIND.to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owner_references: Vec<OwnerReference>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OwnerReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

/// Reference to a namespaced control-plane object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExporterScraperConfigSpec {
    pub exporter_config: ExporterConfig,
    #[serde(default)]
    pub scraper_config: ScraperConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExporterConfig {
    /// Provider whose reference chain drives child spawning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ObjectRef>,
    pub api: Api,
    pub metric_type: MetricType,
    #[serde(default)]
    pub polling_interval: PollingInterval,
    #[serde(default)]
    pub additional_variables: BTreeMap<String, String>,
}

impl ExporterConfig {
    /// The provider reference, if one is configured with a non-empty name.
    pub fn provider(&self) -> Option<&ObjectRef> {
        self.provider.as_ref().filter(|p| !p.name.is_empty())
    }
}

/// Forwarded unchanged (apart from the table suffix) into spawned children.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScraperConfig {
    #[serde(default)]
    pub table_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_type: Option<MetricType>,
    #[serde(default)]
    pub polling_interval: PollingInterval,
    #[serde(default)]
    pub scraper_database_config_ref: ObjectRef,
}

/// Target API description. The server address comes from `endpoint_ref`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Api {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub path: String,
    #[serde(default = "default_verb")]
    pub verb: String,
    /// Extra request headers as `Name: value` strings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_ref: Option<ObjectRef>,
}

fn default_verb() -> String {
    "GET".to_string()
}

/// What the exporter measures; selects normalizer, value column and
/// series naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricType {
    Cost,
    Resource,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Cost => "cost",
            MetricType::Resource => "resource",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cost" => Ok(MetricType::Cost),
            "resource" => Ok(MetricType::Resource),
            _ => Err(ConfigError::UnknownMetricType(s.to_string())),
        }
    }
}

impl Serialize for MetricType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MetricType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Media type of a fetched payload, reduced to what the normalizer handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentType {
    Json,
    Csv,
    Other(String),
}

impl ContentType {
    /// Classify a `Content-Type` header value by its media-type essence.
    pub fn from_header(value: &str) -> Self {
        let essence = value
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "application/json" => ContentType::Json,
            "text/csv" => ContentType::Csv,
            _ => ContentType::Other(essence),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::Json => f.write_str("application/json"),
            ContentType::Csv => f.write_str("text/csv"),
            ContentType::Other(other) => f.write_str(other),
        }
    }
}

impl ExporterScraperConfig {
    /// Load and validate the config from a YAML file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&content)?;
        debug!(?path, name = %config.metadata.name, "config loaded");
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        let config: ExporterScraperConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        let exporter = &self.spec.exporter_config;
        if exporter.polling_interval.as_duration().is_zero() {
            return Err(ConfigError::Invalid(
                "exporterConfig.pollingInterval must be greater than zero".into(),
            ));
        }
        if exporter.api.verb.trim().is_empty() {
            return Err(ConfigError::Invalid("exporterConfig.api.verb is empty".into()));
        }
        Ok(())
    }

    pub fn exporter(&self) -> &ExporterConfig {
        &self.spec.exporter_config
    }
}
