//! GaugeRegistry: the long-lived set of exposed series.
//!
//! Entries and the Prometheus registry share one `RwLock`: the reconciler
//! takes the write side for a whole pass, scrapes take the read side.

use std::collections::HashMap;
use std::sync::Arc;

use finops_table::LabelSet;
use prometheus::{Encoder, Gauge, Registry, TextEncoder};
use tokio::sync::{RwLock, RwLockWriteGuard};

use crate::identity::SeriesIdentity;

/// One exposed series.
pub(crate) struct GaugeEntry {
    pub(crate) name: String,
    pub(crate) labels: LabelSet,
    pub(crate) gauge: Gauge,
    pub(crate) seen: bool,
}

pub(crate) struct Inner {
    pub(crate) registry: Registry,
    pub(crate) entries: HashMap<SeriesIdentity, GaugeEntry>,
}

/// Shared handle; clones refer to the same registry.
#[derive(Clone)]
pub struct GaugeRegistry {
    inner: Arc<RwLock<Inner>>,
}

impl Default for GaugeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GaugeRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                registry: Registry::new(),
                entries: HashMap::new(),
            })),
        }
    }

    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().await
    }

    /// Render all series in the Prometheus text format.
    pub async fn render(&self) -> prometheus::Result<String> {
        let inner = self.inner.read().await;
        let families = inner.registry.gather();
        let mut buf = Vec::new();
        TextEncoder::new().encode(&families, &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    /// Number of exposed series.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Current value of a series, by canonical identity.
    pub async fn value(&self, identity: &str) -> Option<f64> {
        let inner = self.inner.read().await;
        inner
            .entries
            .iter()
            .find(|(id, _)| id.as_str() == identity)
            .map(|(_, entry)| entry.gauge.get())
    }

    /// Sorted identities of all exposed series.
    pub async fn identities(&self) -> Vec<String> {
        let inner = self.inner.read().await;
        let mut ids: Vec<String> = inner.entries.keys().map(|id| id.to_string()).collect();
        ids.sort();
        ids
    }

    /// Series names with their label sets, sorted by identity.
    pub async fn series(&self) -> Vec<(String, LabelSet)> {
        let inner = self.inner.read().await;
        let mut series: Vec<(&SeriesIdentity, &GaugeEntry)> = inner.entries.iter().collect();
        series.sort_by(|a, b| a.0.cmp(b.0));
        series
            .into_iter()
            .map(|(_, entry)| (entry.name.clone(), entry.labels.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_registry_renders_nothing() {
        let registry = GaugeRegistry::new();
        assert!(registry.is_empty().await);
        assert_eq!(registry.render().await.unwrap(), "");
        assert!(registry.identities().await.is_empty());
    }

    #[tokio::test]
    async fn clones_share_state() {
        let registry = GaugeRegistry::new();
        let clone = registry.clone();
        {
            let mut inner = registry.write().await;
            let gauge = Gauge::new("g", "help").unwrap();
            inner.registry.register(Box::new(gauge.clone())).unwrap();
            inner.entries.insert(
                SeriesIdentity::new("g", &LabelSet::default()),
                GaugeEntry {
                    name: "g".into(),
                    labels: LabelSet::default(),
                    gauge,
                    seen: false,
                },
            );
        }
        assert_eq!(clone.len().await, 1);
        assert_eq!(clone.value("g{}").await, Some(0.0));
        assert!(clone.render().await.unwrap().contains("g 0"));
    }
}
