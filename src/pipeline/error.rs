//! Error types for pipeline failures

use crate::engine::EngineError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// External call stage, used to label timeouts and cancellations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Classification,
    CatalogResolution,
    Completion,
    Execution,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Classification => "classification",
            Stage::CatalogResolution => "catalog_resolution",
            Stage::Completion => "completion",
            Stage::Execution => "execution",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request-level failures. Classification faults never appear here.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The capability catalog could not be resolved
    #[error("Capability catalog resolution failed: {0}")]
    CatalogResolution(#[source] EngineError),

    /// The completion engine returned an error
    #[error("Completion failed: {0}")]
    Completion(#[source] EngineError),

    /// An external call exceeded its deadline
    #[error("{stage} timed out after {timeout_ms}ms")]
    Timeout { stage: Stage, timeout_ms: u64 },

    /// The caller cancelled the request
    #[error("Request cancelled during {stage}")]
    Cancelled { stage: Stage },
}

impl PipelineError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::CatalogResolution(_) => "catalog_resolution",
            PipelineError::Completion(_) => "completion",
            PipelineError::Timeout { .. } => "timeout",
            PipelineError::Cancelled { .. } => "cancelled",
        }
    }
}
