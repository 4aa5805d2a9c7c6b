//! Kubernetes-style REST backend.
//!
//! Objects live at `/apis/{group}/{version}/namespaces/{ns}/{plural}/{name}`
//! (core kinds under `/api/{version}/…`). Inside a pod the client
//! authenticates with the mounted service-account token and trusts the
//! mounted cluster CA.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use finops_core::Kind;
use reqwest::StatusCode;
use tracing::debug;

use crate::error::{ControlError, ControlResult};
use crate::{ControlPlane, failure_code};

const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

/// HTTP control-plane client.
#[derive(Clone)]
pub struct KubeControlPlane {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl KubeControlPlane {
    /// Build a client against `base_url` with an optional bearer token.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> ControlResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self::with_client(base_url, token, client))
    }

    pub fn with_client(
        base_url: impl Into<String>,
        token: Option<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            client,
        }
    }

    /// Build a client from the in-cluster environment
    /// (`KUBERNETES_SERVICE_HOST`/`_PORT`, service-account token and CA).
    pub fn in_cluster() -> ControlResult<Self> {
        let host = std::env::var("KUBERNETES_SERVICE_HOST")
            .map_err(|_| ControlError::Config("KUBERNETES_SERVICE_HOST not set".into()))?;
        let port = std::env::var("KUBERNETES_SERVICE_PORT").unwrap_or_else(|_| "443".into());
        let dir = Path::new(SERVICE_ACCOUNT_DIR);

        let token = std::fs::read_to_string(dir.join("token"))
            .map_err(|e| ControlError::Config(format!("reading service account token: {e}")))?;
        let ca = std::fs::read(dir.join("ca.crt"))
            .map_err(|e| ControlError::Config(format!("reading cluster CA: {e}")))?;
        let ca = reqwest::Certificate::from_pem(&ca)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .add_root_certificate(ca)
            .build()?;

        let host = if host.contains(':') {
            format!("[{host}]")
        } else {
            host
        };
        debug!(%host, %port, "using in-cluster control plane");
        Ok(Self::with_client(
            format!("https://{host}:{port}"),
            Some(token.trim().to_string()),
            client,
        ))
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{path}", self.base_url))
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl ControlPlane for KubeControlPlane {
    async fn get(
        &self,
        kind: Kind,
        namespace: &str,
        name: &str,
    ) -> ControlResult<Option<serde_json::Value>> {
        let path = kind.object_path(namespace, name);
        let response = self.request(reqwest::Method::GET, &path).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let parsed: Result<serde_json::Value, _> = serde_json::from_str(&body);
        if let Some(code) = parsed.as_ref().ok().and_then(failure_code) {
            if code == 404 {
                return Ok(None);
            }
            return Err(ControlError::Status { code, body });
        }
        if !status.is_success() {
            return Err(ControlError::Status {
                code: status.as_u16(),
                body,
            });
        }
        Ok(Some(parsed?))
    }

    async fn create(
        &self,
        kind: Kind,
        namespace: &str,
        object: serde_json::Value,
    ) -> ControlResult<serde_json::Value> {
        let path = kind.collection_path(namespace);
        let response = self
            .request(reqwest::Method::POST, &path)
            .json(&object)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ControlError::Status {
                code: status.as_u16(),
                body,
            });
        }
        debug!(%kind, namespace, %path, "object created");
        Ok(serde_json::from_str(&body)?)
    }
}
