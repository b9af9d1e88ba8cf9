use thiserror::Error;

/// Errors produced by the dissector adapter (C1).
///
/// # Examples
/// ```
/// use bandsteer_core::DissectorError;
///
/// let err = DissectorError::Unavailable { binary: "tshark".to_string() };
/// assert!(err.to_string().contains("tshark"));
/// ```
#[derive(Debug, Error)]
pub enum DissectorError {
    #[error("dissector binary not found on PATH: {binary}")]
    Unavailable { binary: String },
    #[error("dissector exited with status {status}: {stderr}")]
    Failed { status: i32, stderr: String },
    #[error("dissector did not finish within {timeout_s}s")]
    Timeout { timeout_s: u64 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
