//! finops-core: shared types for the FinOps exporter.
//!
//! Holds the exporter configuration (`ExporterScraperConfig`), the
//! control-plane object types of the provider → resource → metric
//! reference chain, Go-style duration handling, and `<name>` variable
//! substitution.

pub mod config;
pub mod duration;
pub mod error;
pub mod objects;
pub mod vars;

pub use config::{
    Api, ContentType, EXPORTER_KIND, FINOPS_API_VERSION, ExporterConfig, ExporterScraperConfig, ExporterScraperConfigSpec,
    MetricType, ObjectMeta, ObjectRef, OwnerReference, ScraperConfig,
};
pub use duration::PollingInterval;
pub use error::{ConfigError, ConfigResult};
pub use objects::{
    Kind, MetricConfig, MetricConfigSpec, MetricEndpoint, ProviderConfig, ProviderConfigSpec,
    ResourceConfig, ResourceConfigSpec,
};
pub use vars::{substitute, substitute_with};
