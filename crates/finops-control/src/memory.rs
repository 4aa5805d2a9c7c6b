//! In-memory control plane for tests and local runs.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use finops_core::Kind;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{ControlError, ControlResult};
use crate::ControlPlane;

type ObjectKey = (Kind, String, String);

/// Thread-safe in-memory object store. Cloning shares the same state.
#[derive(Clone, Default)]
pub struct InMemoryControlPlane {
    objects: Arc<RwLock<HashMap<ObjectKey, serde_json::Value>>>,
    creates: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without counting it as a create.
    pub async fn insert(&self, kind: Kind, namespace: &str, name: &str, object: serde_json::Value) {
        self.objects
            .write()
            .await
            .insert((kind, namespace.to_string(), name.to_string()), object);
    }

    /// Number of successful `create` calls.
    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail with [`ControlError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Names of all stored objects of `kind` in `namespace`, sorted.
    pub async fn names(&self, kind: Kind, namespace: &str) -> Vec<String> {
        let objects = self.objects.read().await;
        let mut names: Vec<String> = objects
            .keys()
            .filter(|(k, ns, _)| *k == kind && ns == namespace)
            .map(|(_, _, name)| name.clone())
            .collect();
        names.sort();
        names
    }

    fn check_available(&self) -> ControlResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ControlError::Unavailable("in-memory store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ControlPlane for InMemoryControlPlane {
    async fn get(
        &self,
        kind: Kind,
        namespace: &str,
        name: &str,
    ) -> ControlResult<Option<serde_json::Value>> {
        self.check_available()?;
        let objects = self.objects.read().await;
        Ok(objects
            .get(&(kind, namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn create(
        &self,
        kind: Kind,
        namespace: &str,
        object: serde_json::Value,
    ) -> ControlResult<serde_json::Value> {
        self.check_available()?;
        let name = object
            .pointer("/metadata/name")
            .and_then(|n| n.as_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ControlError::Status {
                code: 422,
                body: "metadata.name is required".into(),
            })?
            .to_string();

        let mut objects = self.objects.write().await;
        let key = (kind, namespace.to_string(), name.clone());
        if objects.contains_key(&key) {
            return Err(ControlError::Status {
                code: 409,
                body: format!("{kind} {namespace}/{name} already exists"),
            });
        }
        objects.insert(key, object.clone());
        self.creates.fetch_add(1, Ordering::SeqCst);
        debug!(%kind, namespace, %name, "object created");
        Ok(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn create_then_get() {
        let control = InMemoryControlPlane::new();
        let obj = json!({"metadata": {"name": "child"}});
        control
            .create(Kind::ExporterScraperConfig, "finops", obj.clone())
            .await
            .unwrap();

        let got = control
            .get(Kind::ExporterScraperConfig, "finops", "child")
            .await
            .unwrap();
        assert_eq!(got, Some(obj));
        assert_eq!(control.create_count(), 1);
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let control = InMemoryControlPlane::new();
        let got = control.get(Kind::MetricConfig, "finops", "cpu").await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn duplicate_create_conflicts() {
        let control = InMemoryControlPlane::new();
        let obj = json!({"metadata": {"name": "child"}});
        control
            .create(Kind::ExporterScraperConfig, "ns", obj.clone())
            .await
            .unwrap();
        let err = control
            .create(Kind::ExporterScraperConfig, "ns", obj)
            .await
            .unwrap_err();
        assert!(matches!(err, ControlError::Status { code: 409, .. }));
        assert_eq!(control.create_count(), 1);
    }

    #[tokio::test]
    async fn create_requires_name() {
        let control = InMemoryControlPlane::new();
        let err = control
            .create(Kind::ExporterScraperConfig, "ns", json!({"metadata": {}}))
            .await
            .unwrap_err();
        assert!(matches!(err, ControlError::Status { code: 422, .. }));
    }

    #[tokio::test]
    async fn unavailable_store_errors() {
        let control = InMemoryControlPlane::new();
        control.set_unavailable(true);
        assert!(matches!(
            control.get(Kind::Secret, "ns", "s").await,
            Err(ControlError::Unavailable(_))
        ));
        control.set_unavailable(false);
        assert!(control.get(Kind::Secret, "ns", "s").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn names_are_scoped_by_kind_and_namespace() {
        let control = InMemoryControlPlane::new();
        control.insert(Kind::MetricConfig, "a", "m2", json!({})).await;
        control.insert(Kind::MetricConfig, "a", "m1", json!({})).await;
        control.insert(Kind::MetricConfig, "b", "m3", json!({})).await;
        control.insert(Kind::ResourceConfig, "a", "r1", json!({})).await;
        assert_eq!(control.names(Kind::MetricConfig, "a").await, vec!["m1", "m2"]);
    }
}
