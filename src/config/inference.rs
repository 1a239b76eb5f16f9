//! Inference endpoint configuration

use serde::{Deserialize, Serialize};

/// OpenAI-compatible endpoint used for classification and completions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Base URL (e.g., "http://localhost:11434")
    pub base_url: String,
    /// Small, fast model used by the intent classifier
    pub classifier_model: String,
    /// Model used for the main completion
    pub completion_model: String,
    /// Environment variable holding the API key, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            classifier_model: "llama3.2:1b".to_string(),
            completion_model: "llama3.1:8b".to_string(),
            api_key_env: None,
        }
    }
}

impl InferenceConfig {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.is_empty())
    }
}
