//! Error types for collaborator calls.

use thiserror::Error;

/// Errors returned by the external collaborators the pipeline calls into.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Network connectivity error (DNS, connection refused, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded deadline.
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Remote service returned an error response (4xx, 5xx).
    #[error("Upstream error {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Response doesn't match the expected format.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Collaborator refused or could not serve the call.
    #[error("Unavailable: {0}")]
    Unavailable(String),
}

impl EngineError {
    /// Map a reqwest error onto the collaborator taxonomy.
    pub fn from_reqwest(err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            EngineError::Timeout(timeout_ms)
        } else {
            EngineError::Network(err.to_string())
        }
    }
}
