//! Resolved API endpoint and its auth method.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::debug;

use crate::error::{FetchError, FetchResult};

/// How requests to an endpoint authenticate.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum AuthMethod {
    #[default]
    None,
    BearerToken(String),
    Basic {
        username: String,
        password: String,
    },
    /// Client certificate and key, both PEM.
    CertFile { cert: Vec<u8>, key: Vec<u8> },
}

impl AuthMethod {
    pub fn name(&self) -> &'static str {
        match self {
            AuthMethod::None => "none",
            AuthMethod::BearerToken(_) => "bearer-token",
            AuthMethod::Basic { .. } => "basic",
            AuthMethod::CertFile { .. } => "cert-file",
        }
    }
}

// Credentials stay out of logs.
impl std::fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A resolved remote API: base URL plus TLS and auth settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoint {
    pub server_url: String,
    pub auth: AuthMethod,
    /// Extra PEM CA bundle to trust.
    pub certificate_authority: Option<Vec<u8>>,
    pub insecure: bool,
}

impl Endpoint {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            ..Self::default()
        }
    }

    pub fn with_auth(mut self, auth: AuthMethod) -> Self {
        self.auth = auth;
        self
    }

    /// Build an endpoint from decoded secret data.
    ///
    /// Keys: `server-url` (required), `token`, `username`/`password`,
    /// `client-certificate-data`/`client-key-data`,
    /// `certificate-authority-data`, `insecure`. The first complete
    /// credential in that order selects the auth method.
    pub fn from_secret_data(data: &BTreeMap<String, Vec<u8>>) -> FetchResult<Self> {
        let text = |key: &str| -> Option<String> {
            data.get(key)
                .map(|v| String::from_utf8_lossy(v).trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let server_url = text("server-url")
            .ok_or_else(|| FetchError::Resolve("secret has no server-url".into()))?;

        let auth = if let Some(token) = text("token") {
            AuthMethod::BearerToken(token)
        } else if let (Some(username), Some(password)) = (text("username"), text("password")) {
            AuthMethod::Basic { username, password }
        } else if let (Some(cert), Some(key)) = (
            data.get("client-certificate-data"),
            data.get("client-key-data"),
        ) {
            AuthMethod::CertFile {
                cert: cert.clone(),
                key: key.clone(),
            }
        } else {
            AuthMethod::None
        };

        Ok(Self {
            server_url,
            auth,
            certificate_authority: data.get("certificate-authority-data").cloned(),
            insecure: text("insecure").is_some_and(|v| v.eq_ignore_ascii_case("true")),
        })
    }

    /// Build an HTTP client honouring the endpoint's TLS settings and
    /// client identity. `timeout` bounds each whole request.
    pub fn client(&self, timeout: Duration) -> FetchResult<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(timeout);

        if let Some(ca) = &self.certificate_authority {
            let cert = reqwest::Certificate::from_pem(ca)
                .map_err(|e| FetchError::Auth(format!("invalid certificate authority: {e}")))?;
            builder = builder.add_root_certificate(cert);
        }
        if self.insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let AuthMethod::CertFile { cert, key } = &self.auth {
            let mut pem = cert.clone();
            pem.push(b'\n');
            pem.extend_from_slice(key);
            let identity = reqwest::Identity::from_pem(&pem)
                .map_err(|e| FetchError::Auth(format!("invalid client certificate: {e}")))?;
            builder = builder.identity(identity);
        }

        debug!(auth = self.auth.name(), insecure = self.insecure, "http client built");
        Ok(builder.build()?)
    }

    /// Attach header-based credentials to a request.
    pub fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            AuthMethod::BearerToken(token) => request.bearer_auth(token),
            AuthMethod::Basic { username, password } => request.basic_auth(username, Some(password)),
            AuthMethod::None | AuthMethod::CertFile { .. } => request,
        }
    }
}
