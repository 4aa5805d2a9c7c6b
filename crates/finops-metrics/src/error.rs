//! Reconciliation errors.

use thiserror::Error;

/// Batch-level failures. Row-level problems (bad cell, invalid label
/// name) are logged and counted in the report instead.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("value column {0} not found in header")]
    MissingColumn(String),
}
