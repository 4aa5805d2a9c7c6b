//! finops-control: control-plane access for the FinOps exporter.
//!
//! The exporter reads its reference chain (`ProviderConfig`,
//! `ResourceConfig`, `MetricConfig`), endpoint secrets, and writes child
//! `ExporterScraperConfig` objects through the [`ControlPlane`] trait.
//!
//! # Backends
//!
//! ```text
//!   ┌──────────────┐      GET/POST       ┌────────────────────────┐
//!   │ ControlPlane │ ──────────────────▶ │ KubeControlPlane       │ ── HTTPS ──▶ API server
//!   │   (trait)    │                     ├────────────────────────┤
//!   └──────────────┘                     │ InMemoryControlPlane   │   (tests, local runs)
//!                                        └────────────────────────┘
//! ```
//!
//! Objects cross the trait as `serde_json::Value`; [`fetch_object`] and
//! [`fetch_required`] decode them into typed structs.

pub mod error;
pub mod kube;
pub mod memory;

use async_trait::async_trait;
use finops_core::Kind;
use serde::de::DeserializeOwned;

pub use error::{ControlError, ControlResult};
pub use kube::KubeControlPlane;
pub use memory::InMemoryControlPlane;

/// Namespaced object store the exporter reads from and writes to.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Fetch one object. `Ok(None)` means the object does not exist.
    async fn get(
        &self,
        kind: Kind,
        namespace: &str,
        name: &str,
    ) -> ControlResult<Option<serde_json::Value>>;

    /// Create an object and return the stored representation.
    async fn create(
        &self,
        kind: Kind,
        namespace: &str,
        object: serde_json::Value,
    ) -> ControlResult<serde_json::Value>;
}

/// Fetch and decode an object, `None` when it does not exist.
pub async fn fetch_object<T: DeserializeOwned>(
    control: &dyn ControlPlane,
    kind: Kind,
    namespace: &str,
    name: &str,
) -> ControlResult<Option<T>> {
    match control.get(kind, namespace, name).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Fetch and decode an object that must exist.
pub async fn fetch_required<T: DeserializeOwned>(
    control: &dyn ControlPlane,
    kind: Kind,
    namespace: &str,
    name: &str,
) -> ControlResult<T> {
    fetch_object(control, kind, namespace, name)
        .await?
        .ok_or_else(|| ControlError::NotFound {
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
}

/// Kubernetes `Status` failure check: `Some(code)` when `value` is a
/// `Status` object reporting failure.
pub fn failure_code(value: &serde_json::Value) -> Option<u16> {
    let is_status = value.get("kind").and_then(|k| k.as_str()) == Some("Status");
    let failed = value.get("status").and_then(|s| s.as_str()) == Some("Failure");
    if !(is_status && failed) {
        return None;
    }
    let code = value
        .get("code")
        .and_then(|c| c.as_u64())
        .and_then(|c| u16::try_from(c).ok())
        .unwrap_or(500);
    Some(code)
}
