//! finops-spawner: resource discovery and child exporter creation.
//!
//! When an exporter references a ProviderConfig, every cost batch is
//! scanned for resources the provider's chain knows about. Each such
//! resource gets one resource-usage exporter per configured metric.
//!
//! ```text
//!   ProviderConfig ──► ResourceConfig* ──► MetricConfig*     (ReferenceChain)
//!                              │
//!   cost Records ──► DiscoveredResources (append-only, indexed)
//!                              │
//!                  build_child(i, j) ──► GET ──► absent? POST
//! ```

pub mod chain;
pub mod child;
pub mod discovery;
pub mod error;
pub mod spawner;
pub mod timespan;

pub use chain::{ReferenceChain, ResourceMetrics};
pub use child::{ChildSlot, RESOURCE_ID_VARIABLE, RESOURCE_TABLE_SUFFIX, build_child, child_name};
pub use discovery::{DiscoveredResource, DiscoveredResources};
pub use error::SpawnError;
pub use spawner::{Clock, ResourceSpawner, SpawnReport};
pub use timespan::{compute_timespan, format_suffix, query_escape};
