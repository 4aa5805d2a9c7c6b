//! The fetch loop: resolve, request, chase async jobs, retry.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use finops_core::{Api, ContentType, substitute};
use reqwest::header::{CONTENT_TYPE, LOCATION, RETRY_AFTER};
use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::endpoint::Endpoint;
use crate::error::{FetchError, FetchResult};
use crate::resolver::EndpointResolver;
use crate::retry::{RetryPolicy, pause};

/// A successfully fetched body and its declared content type.
#[derive(Debug, Clone)]
pub struct Payload {
    pub body: Bytes,
    pub content_type: ContentType,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobStatus {
    download_url: String,
}

/// Upper bound on one request, connect through body.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub struct Fetcher {
    resolver: Arc<dyn EndpointResolver>,
    retry: RetryPolicy,
    request_timeout: Duration,
    download: reqwest::Client,
}

impl Fetcher {
    pub fn new(resolver: Arc<dyn EndpointResolver>, retry: RetryPolicy) -> FetchResult<Self> {
        Ok(Self {
            resolver,
            retry,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            download: download_client(DEFAULT_REQUEST_TIMEOUT)?,
        })
    }

    /// Replace the per-request timeout. A request that exceeds it fails
    /// the attempt and is retried like any transport error.
    pub fn with_request_timeout(mut self, timeout: Duration) -> FetchResult<Self> {
        self.request_timeout = timeout;
        self.download = download_client(timeout)?;
        Ok(self)
    }

    /// Fetch `api`, retrying every failure after the retry delay until it
    /// succeeds or `shutdown` fires. In-flight requests are abandoned on
    /// shutdown.
    pub async fn fetch(
        &self,
        api: &Api,
        vars: &BTreeMap<String, String>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> FetchResult<Payload> {
        let mut attempt = 0u64;
        loop {
            attempt += 1;
            let mut stop = shutdown.clone();
            let outcome = tokio::select! {
                outcome = self.attempt(api, vars, shutdown) => outcome,
                _ = stop.wait_for(|stop| *stop) => Err(FetchError::Cancelled),
            };
            match outcome {
                Ok(payload) => {
                    info!(
                        attempt,
                        bytes = payload.body.len(),
                        content_type = %payload.content_type,
                        "fetch succeeded"
                    );
                    return Ok(payload);
                }
                Err(FetchError::Cancelled) => return Err(FetchError::Cancelled),
                Err(e) => {
                    warn!(
                        attempt,
                        error = %e,
                        retry_in_ms = self.retry.delay.as_millis() as u64,
                        "fetch failed, retrying"
                    );
                    self.retry.backoff(shutdown).await?;
                }
            }
        }
    }

    async fn attempt(
        &self,
        api: &Api,
        vars: &BTreeMap<String, String>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> FetchResult<Payload> {
        let endpoint = self.resolver.resolve(api.endpoint_ref.as_ref()).await?;
        let client = endpoint.client(self.request_timeout)?;

        let url = join_url(
            &substitute(&endpoint.server_url, vars),
            &substitute(&api.path, vars),
        );
        let url = Url::parse(&url).map_err(|e| FetchError::InvalidRequest(format!("{url}: {e}")))?;
        let method = Method::from_bytes(api.verb.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| FetchError::InvalidRequest(format!("invalid verb {}", api.verb)))?;

        let mut request = endpoint.authorize(client.request(method.clone(), url.clone()));
        for (name, value) in parse_headers(&api.headers)? {
            request = request.header(name, substitute(&value, vars));
        }
        if let Some(payload) = &api.payload {
            request = request.body(substitute(payload, vars));
        }

        debug!(%method, %url, "sending request");
        let response = request.send().await?;
        match response.status() {
            StatusCode::OK => {
                let content_type = content_type_of(&response);
                let body = response.bytes().await?;
                Ok(Payload { body, content_type })
            }
            StatusCode::ACCEPTED => {
                let retry_after = retry_after(&response);
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| FetchError::Job("202 without Location header".into()))?;
                let location = url
                    .join(location)
                    .map_err(|e| FetchError::Job(format!("bad Location {location}: {e}")))?;
                info!(%location, retry_after_secs = retry_after.as_secs(), "async job accepted");
                pause(retry_after, shutdown).await?;
                self.follow_job(&client, &endpoint, location).await
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(FetchError::Status {
                    code: status.as_u16(),
                    body,
                })
            }
        }
    }

    async fn follow_job(
        &self,
        client: &reqwest::Client,
        endpoint: &Endpoint,
        location: Url,
    ) -> FetchResult<Payload> {
        let response = endpoint.authorize(client.get(location.clone())).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Job(format!(
                "job status {} returned {}",
                location,
                response.status()
            )));
        }
        let job: JobStatus = response
            .json()
            .await
            .map_err(|e| FetchError::Job(format!("decoding job status: {e}")))?;

        debug!(download_url = %job.download_url, "downloading job result");
        let response = self.download.get(&job.download_url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Job(format!(
                "download returned {}",
                response.status()
            )));
        }
        let content_type = content_type_of(&response);
        let body = response.bytes().await?;
        Ok(Payload { body, content_type })
    }
}

fn download_client(timeout: Duration) -> FetchResult<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .timeout(timeout)
        .build()?)
}

fn content_type_of(response: &reqwest::Response) -> ContentType {
    let raw = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    ContentType::from_header(raw)
}

/// `Retry-After` in whole seconds; absent or unparseable means zero.
fn retry_after(response: &reqwest::Response) -> Duration {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or_default()
}

/// Concatenate base URL and path without doubling the separator.
pub fn join_url(server_url: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{}{path}", server_url.trim_end_matches('/'))
    } else {
        format!("{server_url}{path}")
    }
}

/// Split `Name: value` header lines.
pub fn parse_headers(headers: &[String]) -> FetchResult<Vec<(String, String)>> {
    headers
        .iter()
        .map(|line| {
            line.split_once(':')
                .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
                .filter(|(name, _)| !name.is_empty())
                .ok_or_else(|| FetchError::InvalidRequest(format!("malformed header {line:?}")))
        })
        .collect()
}
