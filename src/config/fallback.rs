//! Fallback detector configuration

use crate::fallback::DEFAULT_INABILITY_PHRASES;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Run the detector on schema-less completions
    pub enabled: bool,
    /// Case-insensitive phrases signalling the model lacked access
    pub phrases: Vec<String>,
    /// Capability names shorter than this are not matched in responses
    pub min_capability_name_len: usize,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            phrases: DEFAULT_INABILITY_PHRASES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            min_capability_name_len: 3,
        }
    }
}
