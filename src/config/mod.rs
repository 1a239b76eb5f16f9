//! Configuration module for the capability gate
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`GATE_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use nexus_gate::config::GateConfig;
//!
//! let config = GateConfig::default();
//! assert_eq!(config.cache.ttl_seconds, 300);
//!
//! let toml = r#"
//! [cache]
//! max_entries = 250
//! "#;
//! let config: GateConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.cache.max_entries, 250);
//! ```

pub mod cache;
pub mod classifier;
pub mod error;
pub mod fallback;
pub mod inference;
pub mod logging;
pub mod metrics;
pub mod pipeline;

pub use cache::{CacheConfig, MAX_TTL_SECONDS};
pub use classifier::ClassifierConfig;
pub use error::ConfigError;
pub use fallback::FallbackConfig;
pub use inference::InferenceConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use metrics::MetricsConfig;
pub use pipeline::PipelineConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Annotated example configuration shipped with the crate.
pub const EXAMPLE_CONFIG: &str = include_str!("../../gate.example.toml");

/// Unified configuration for the capability gate.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Classification cache bounds
    pub cache: CacheConfig,
    /// Intent classifier settings
    pub classifier: ClassifierConfig,
    /// Fallback detector settings
    pub fallback: FallbackConfig,
    /// Orchestrator timeouts and loading policy
    pub pipeline: PipelineConfig,
    /// Metrics window and publishing
    pub metrics: MetricsConfig,
    /// OpenAI-compatible endpoint
    pub inference: InferenceConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl GateConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(ttl) = std::env::var("GATE_CACHE_TTL_SECONDS") {
            if let Ok(v) = ttl.parse() {
                self.cache.ttl_seconds = v;
            }
        }
        if let Ok(max) = std::env::var("GATE_CACHE_MAX_ENTRIES") {
            if let Ok(v) = max.parse() {
                self.cache.max_entries = v;
            }
        }

        if let Ok(url) = std::env::var("GATE_INFERENCE_URL") {
            self.inference.base_url = url;
        }
        if let Ok(model) = std::env::var("GATE_CLASSIFIER_MODEL") {
            self.inference.classifier_model = model;
        }

        if let Ok(level) = std::env::var("GATE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("GATE_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.max_entries == 0 {
            return Err(ConfigError::validation(
                "cache.max_entries",
                "must be greater than zero",
            ));
        }
        if self.cache.ttl_seconds == 0 {
            return Err(ConfigError::validation(
                "cache.ttl_seconds",
                "must be greater than zero",
            ));
        }
        if self.cache.ttl_seconds > MAX_TTL_SECONDS {
            return Err(ConfigError::validation(
                "cache.ttl_seconds",
                &format!("must be at most {} (one year)", MAX_TTL_SECONDS),
            ));
        }
        if self.cache.sweep_interval_seconds == 0 {
            return Err(ConfigError::validation(
                "cache.sweep_interval_seconds",
                "must be greater than zero",
            ));
        }

        let timeouts = [
            ("classifier.timeout_ms", self.classifier.timeout_ms),
            (
                "pipeline.completion_timeout_ms",
                self.pipeline.completion_timeout_ms,
            ),
            ("pipeline.resolve_timeout_ms", self.pipeline.resolve_timeout_ms),
            (
                "pipeline.execution_timeout_ms",
                self.pipeline.execution_timeout_ms,
            ),
        ];
        for (field, value) in timeouts {
            if value == 0 {
                return Err(ConfigError::validation(field, "timeout must be non-zero"));
            }
        }

        if self.metrics.publish_interval_seconds == 0 {
            return Err(ConfigError::validation(
                "metrics.publish_interval_seconds",
                "must be greater than zero",
            ));
        }
        if self.metrics.window_size == 0 {
            return Err(ConfigError::validation(
                "metrics.window_size",
                "must be greater than zero",
            ));
        }
        if self.inference.base_url.trim().is_empty() {
            return Err(ConfigError::validation(
                "inference.base_url",
                "URL cannot be empty",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_gate_config_defaults() {
        let config = GateConfig::default();
        assert_eq!(config.cache.ttl_seconds, 300);
        assert_eq!(config.cache.max_entries, 1000);
        assert_eq!(config.classifier.timeout_ms, 3000);
        assert!(config.fallback.enabled);
        assert!(!config.pipeline.selective_loading);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_parse_minimal_toml() {
        let toml = r#"
        [cache]
        ttl_seconds = 60
        "#;

        let config: GateConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.cache.ttl_seconds, 60);
        assert_eq!(config.cache.max_entries, 1000); // Default
    }

    #[test]
    fn test_config_parse_example_file() {
        let config: GateConfig = toml::from_str(EXAMPLE_CONFIG).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.max_entries, 1000);
    }

    #[test]
    fn test_config_load_from_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[classifier]\ntimeout_ms = 1500").unwrap();

        let config = GateConfig::load(Some(temp.path())).unwrap();
        assert_eq!(config.classifier.timeout_ms, 1500);
    }

    #[test]
    fn test_config_load_parse_error() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[cache\nttl_seconds = ").unwrap();

        let result = GateConfig::load(Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_missing_file_error() {
        let result = GateConfig::load(Some(Path::new("/nonexistent/gate.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_config_load_none_returns_defaults() {
        let config = GateConfig::load(None).unwrap();
        assert_eq!(config.cache.ttl_seconds, 300);
    }

    #[test]
    fn test_config_env_override_cache() {
        std::env::set_var("GATE_CACHE_MAX_ENTRIES", "42");
        let config = GateConfig::default().with_env_overrides();
        std::env::remove_var("GATE_CACHE_MAX_ENTRIES");

        assert_eq!(config.cache.max_entries, 42);
    }

    #[test]
    fn test_config_env_invalid_value_ignored() {
        std::env::set_var("GATE_CACHE_TTL_SECONDS", "five minutes");
        let config = GateConfig::default().with_env_overrides();
        std::env::remove_var("GATE_CACHE_TTL_SECONDS");

        assert_eq!(config.cache.ttl_seconds, 300);
    }

    #[test]
    fn test_config_env_override_inference_url() {
        std::env::set_var("GATE_INFERENCE_URL", "http://10.0.0.5:8000");
        let config = GateConfig::default().with_env_overrides();
        std::env::remove_var("GATE_INFERENCE_URL");

        assert_eq!(config.inference.base_url, "http://10.0.0.5:8000");
    }

    #[test]
    fn test_config_validation_zero_max_entries() {
        let mut config = GateConfig::default();
        config.cache.max_entries = 0;

        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::Validation { ref field, .. }) if field == "cache.max_entries"
        ));
    }

    #[test]
    fn test_config_validation_huge_ttl_rejected() {
        let config: GateConfig =
            toml::from_str("[cache]\nttl_seconds = 9223372036854775807").unwrap();

        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::Validation { ref field, .. }) if field == "cache.ttl_seconds"
        ));
    }

    #[test]
    fn test_config_validation_max_ttl_accepted() {
        let mut config = GateConfig::default();
        config.cache.ttl_seconds = MAX_TTL_SECONDS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_zero_publish_interval() {
        let mut config = GateConfig::default();
        config.metrics.publish_interval_seconds = 0;

        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::Validation { ref field, .. }) if field == "metrics.publish_interval_seconds"
        ));
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = GateConfig::default();
        config.pipeline.execution_timeout_ms = 0;

        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::Validation { ref field, .. }) if field == "pipeline.execution_timeout_ms"
        ));
    }

    #[test]
    fn test_config_validation_empty_base_url() {
        let mut config = GateConfig::default();
        config.inference.base_url = "  ".to_string();

        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::Validation { ref field, .. }) if field == "inference.base_url"
        ));
    }
}
