use thiserror::Error;

use crate::dissector::DissectorError;

/// I/O and serialization failures from the persistence layer (C8/C9).
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("analysis not found: {0}")]
    NotFound(String),
}

/// Umbrella error for `analyze_capture`. Only C1 failures (dissector
/// unavailable/failed/timed out) and capture-level validation abort the
/// analysis outright; everything past C1 degrades individual compliance
/// checks instead of raising (§7).
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Dissector(#[from] DissectorError),
    #[error("capture contains no 802.11 management/action frames")]
    InvalidCapture,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
