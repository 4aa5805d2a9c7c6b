//! Normalizer errors.

use thiserror::Error;

/// Result type alias for normalization.
pub type NormalizeResult<T> = Result<T, NormalizeError>;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}
