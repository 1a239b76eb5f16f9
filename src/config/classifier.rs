//! Intent classifier configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Deadline for the auxiliary inference call
    pub timeout_ms: u64,
    /// Message characters sent to the auxiliary model
    pub max_message_chars: usize,
    /// Turn low-confidence "no capabilities" answers into capability loads
    pub escalate_low_confidence: bool,
    /// Consult and populate the classification cache
    pub cache_enabled: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 3000,
            max_message_chars: 2000,
            escalate_low_confidence: true,
            cache_enabled: true,
        }
    }
}
