//! Pipeline orchestrator configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Deadline for each completion call
    pub completion_timeout_ms: u64,
    /// Deadline for capability catalog resolution
    pub resolve_timeout_ms: u64,
    /// Deadline for each capability invocation
    pub execution_timeout_ms: u64,
    /// Narrow the loaded set to the classifier's suggestions when they match
    pub selective_loading: bool,
    /// System prompt prepended to every completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            completion_timeout_ms: 120_000,
            resolve_timeout_ms: 10_000,
            execution_timeout_ms: 30_000,
            selective_loading: false,
            system_prompt: None,
        }
    }
}
