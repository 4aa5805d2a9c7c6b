//! Fetcher errors.

use thiserror::Error;

/// Result type alias for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors raised by a single fetch attempt. Everything except
/// [`FetchError::Cancelled`] is retried by [`crate::Fetcher::fetch`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetch cancelled by shutdown")]
    Cancelled,

    #[error("endpoint resolution failed: {0}")]
    Resolve(String),

    #[error("auth setup failed: {0}")]
    Auth(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("async job failed: {0}")]
    Job(String),
}
