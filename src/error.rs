//! Indexer error types.

use serde::Serialize;
use thiserror::Error;

/// Category carried by `ErrorChanged` notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The caller asked for an operation the indexer does not support.
    InvalidOperation,
    /// The scan queue drained and the most recent scan failed.
    ChainFailure,
}

/// Errors returned to callers of the indexer facade.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("The media indexer must be created inside a tokio runtime")]
    NoRuntime,
}
