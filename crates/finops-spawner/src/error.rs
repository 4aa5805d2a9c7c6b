//! Spawner errors.

use finops_control::ControlError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("exporter has no provider reference")]
    MissingProvider,

    #[error("reference chain unavailable: {0}")]
    Chain(#[from] ControlError),

    #[error("failed to encode child config: {0}")]
    Encode(#[from] serde_json::Error),
}
