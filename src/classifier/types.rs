//! Classification decision types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rationale recorded on the fail-safe decision.
pub const FAILSAFE_RATIONALE: &str = "classification unavailable";

/// Classifier's self-reported certainty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Confidence::High),
            "medium" => Ok(Confidence::Medium),
            "low" => Ok(Confidence::Low),
            _ => Err(format!("Invalid confidence: {}", s)),
        }
    }
}

/// Where a returned decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    /// Fresh auxiliary inference call.
    #[default]
    Model,
    /// Served from the classification cache.
    Cache,
    /// Substituted because classification could not complete.
    FailSafe,
}

/// Whether a request needs its capability set loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationDecision {
    pub requires_capabilities: bool,
    pub confidence: Confidence,
    /// Logging only, never interpreted.
    pub rationale: String,
    /// Advisory hint; only narrows loading when selective loading is enabled.
    #[serde(default)]
    pub suggested_capability_names: Vec<String>,
    /// Latency of the classification that produced this decision.
    pub elapsed_ms: u64,
    #[serde(default)]
    pub source: DecisionSource,
}

impl ClassificationDecision {
    /// The decision substituted on any classifier fault.
    ///
    /// Always loads capabilities.
    pub fn fail_safe(elapsed_ms: u64) -> Self {
        Self {
            requires_capabilities: true,
            confidence: Confidence::Low,
            rationale: FAILSAFE_RATIONALE.to_string(),
            suggested_capability_names: Vec::new(),
            elapsed_ms,
            source: DecisionSource::FailSafe,
        }
    }

    pub fn is_fail_safe(&self) -> bool {
        self.source == DecisionSource::FailSafe
    }

    pub fn is_cache_hit(&self) -> bool {
        self.source == DecisionSource::Cache
    }
}
