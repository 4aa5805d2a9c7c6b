//! Endpoint resolvers.
//!
//! The fetcher resolves its endpoint on every attempt, so a rotated secret
//! or a moved server is picked up by the next retry.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use finops_control::ControlPlane;
use finops_core::{Kind, ObjectRef};
use tracing::debug;

use crate::endpoint::Endpoint;
use crate::error::{FetchError, FetchResult};

#[async_trait]
pub trait EndpointResolver: Send + Sync {
    /// Resolve the endpoint behind `reference` (the API's `endpointRef`).
    async fn resolve(&self, reference: Option<&ObjectRef>) -> FetchResult<Endpoint>;
}

/// Always yields the same endpoint, whatever the reference.
pub struct StaticResolver {
    endpoint: Endpoint,
}

impl StaticResolver {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl EndpointResolver for StaticResolver {
    async fn resolve(&self, _reference: Option<&ObjectRef>) -> FetchResult<Endpoint> {
        Ok(self.endpoint.clone())
    }
}

/// Never yields an endpoint. Used when neither a control plane nor a fixed
/// URL is available, so every attempt fails and is retried.
pub struct UnavailableResolver {
    reason: String,
}

impl UnavailableResolver {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl EndpointResolver for UnavailableResolver {
    async fn resolve(&self, _reference: Option<&ObjectRef>) -> FetchResult<Endpoint> {
        Err(FetchError::Resolve(self.reason.clone()))
    }
}

/// Reads the referenced `Secret` from the control plane and decodes its
/// base64 `data` map into an [`Endpoint`].
pub struct SecretResolver {
    control: Arc<dyn ControlPlane>,
}

impl SecretResolver {
    pub fn new(control: Arc<dyn ControlPlane>) -> Self {
        Self { control }
    }
}

#[async_trait]
impl EndpointResolver for SecretResolver {
    async fn resolve(&self, reference: Option<&ObjectRef>) -> FetchResult<Endpoint> {
        let reference = reference
            .filter(|r| !r.name.is_empty())
            .ok_or_else(|| FetchError::Resolve("api has no endpointRef".into()))?;

        let secret = self
            .control
            .get(Kind::Secret, &reference.namespace, &reference.name)
            .await
            .map_err(|e| FetchError::Resolve(e.to_string()))?
            .ok_or_else(|| {
                FetchError::Resolve(format!(
                    "secret {}/{} not found",
                    reference.namespace, reference.name
                ))
            })?;

        let data = decode_secret_data(&secret)?;
        debug!(
            namespace = %reference.namespace,
            name = %reference.name,
            keys = data.len(),
            "endpoint secret loaded"
        );
        Endpoint::from_secret_data(&data)
    }
}

fn decode_secret_data(secret: &serde_json::Value) -> FetchResult<BTreeMap<String, Vec<u8>>> {
    let Some(data) = secret.get("data").and_then(|d| d.as_object()) else {
        return Ok(BTreeMap::new());
    };
    data.iter()
        .filter_map(|(key, value)| value.as_str().map(|v| (key, v)))
        .map(|(key, value)| {
            STANDARD
                .decode(value.trim())
                .map(|bytes| (key.clone(), bytes))
                .map_err(|e| FetchError::Resolve(format!("secret key {key}: {e}")))
        })
        .collect()
}
