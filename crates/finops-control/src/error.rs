//! Control-plane client errors.

use thiserror::Error;

/// Result type alias for control-plane operations.
pub type ControlResult<T> = Result<T, ControlError>;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("control plane request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("control plane returned {code}: {body}")]
    Status { code: u16, body: String },

    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: String,
        namespace: String,
        name: String,
    },

    #[error("failed to decode object: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("control plane client configuration: {0}")]
    Config(String),

    #[error("control plane unavailable: {0}")]
    Unavailable(String),
}
