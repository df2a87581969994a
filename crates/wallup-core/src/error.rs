//! Upload error taxonomy and transport/status classification.
//!
//! This module encapsulates error classification (timeouts, connection
//! failures, HTTP status families) so the orchestrator can decide which
//! failures the caller may retry and which are terminal.

use std::time::Duration;

use crate::thumbnail::ThumbnailError;

/// High-level classification of a transport or HTTP failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation timed out (connect/read).
    Timeout,
    /// Network-level failure (connection refused, DNS, reset).
    Connection,
    /// Retryable server-side HTTP status (5xx).
    Http5xx(u16),
    /// Any other error (typically not retried).
    Other,
}

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u16) -> ErrorKind {
    match code {
        500..=599 => ErrorKind::Http5xx(code),
        _ => ErrorKind::Other,
    }
}

/// Classify a reqwest transport error for retry decisions.
pub fn classify_transport(e: &reqwest::Error) -> ErrorKind {
    if e.is_timeout() {
        return ErrorKind::Timeout;
    }
    if e.is_connect() || e.is_request() || e.is_body() {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

/// Error surfaced by one upload attempt.
///
/// Every variant is caught at the orchestrator boundary and folded into the
/// returned `UploadOutcome`; nothing escapes the public `upload` contract.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Missing user, offline connection, or invalid source file. Never
    /// retried, never triggers compensation.
    #[error("{0}")]
    Validation(String),
    /// Thumbnail decode/encode failed. Fatal to the job.
    #[error("thumbnail: {0}")]
    Thumbnail(#[from] ThumbnailError),
    /// Full-image store step failed. Fatal but retryable.
    #[error("{0}")]
    Storage(String),
    /// Metadata save failed. Fatal, retryable, compensated on first attempts.
    #[error("{0}")]
    Persistence(String),
    /// The whole-job deadline expired. Always retryable.
    #[error("upload timed out after {0:?}")]
    Timeout(Duration),
    /// Generic transport failure from the HTTP client.
    #[error("network: {0}")]
    Network(#[source] reqwest::Error),
    /// Explicit user cancellation.
    #[error("upload cancelled")]
    Cancelled,
}

impl UploadError {
    /// Whether the caller may retry this attempt. There is no automatic retry
    /// loop; this only drives the retry/resume affordance in the UI.
    pub fn is_retryable(&self) -> bool {
        match self {
            UploadError::Timeout(_)
            | UploadError::Network(_)
            | UploadError::Storage(_)
            | UploadError::Persistence(_) => true,
            UploadError::Validation(_) | UploadError::Thumbnail(_) | UploadError::Cancelled => {
                false
            }
        }
    }
}
