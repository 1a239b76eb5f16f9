//! # Fallback Detector
//!
//! Second line of defense against a wrong "no capabilities" classification.
//! Inspects a schema-less completion for signs it could not do what was
//! asked. A trigger costs one retry, so false positives are acceptable.

use crate::config::FallbackConfig;
use serde::Serialize;

/// Strategy deciding whether a schema-less answer missed a capability need.
pub trait FallbackDetector: Send + Sync + 'static {
    fn detect_missed_capability_need(
        &self,
        response_text: &str,
        available_capability_names: &[String],
    ) -> bool;
}

/// Evidence found in a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FallbackSignal {
    /// The response says the assistant lacks access or ability.
    InabilityPhrase(String),
    /// The response names a capability it was not given.
    CapabilityMention(String),
}

impl std::fmt::Display for FallbackSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackSignal::InabilityPhrase(p) => write!(f, "inability phrase \"{}\"", p),
            FallbackSignal::CapabilityMention(n) => write!(f, "capability mention \"{}\"", n),
        }
    }
}

/// Default inability phrases, lowercase with ASCII apostrophes.
pub const DEFAULT_INABILITY_PHRASES: &[&str] = &[
    "i would need to",
    "i'd need to",
    "i can't",
    "i cannot",
    "i can not",
    "i'm unable to",
    "i am unable to",
    "unable to",
    "i'm not able to",
    "i am not able to",
    "i don't have access",
    "i do not have access",
    "i don't have the ability",
    "i do not have the ability",
    "i don't have permission",
    "i do not have permission",
    "no access to",
];

/// Case-insensitive phrase and capability-name matcher.
#[derive(Debug, Clone)]
pub struct PhraseFallbackDetector {
    phrases: Vec<String>,
    min_name_len: usize,
}

impl PhraseFallbackDetector {
    pub fn new(phrases: Vec<String>, min_name_len: usize) -> Self {
        let phrases = phrases
            .into_iter()
            .map(|p| normalize(&p))
            .filter(|p| !p.is_empty())
            .collect();
        Self {
            phrases,
            min_name_len,
        }
    }

    pub fn from_config(config: &FallbackConfig) -> Self {
        Self::new(config.phrases.clone(), config.min_capability_name_len)
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// All signals present in `response_text`.
    pub fn signals(
        &self,
        response_text: &str,
        available_capability_names: &[String],
    ) -> Vec<FallbackSignal> {
        let text = normalize(response_text);
        let mut signals: Vec<FallbackSignal> = self
            .phrases
            .iter()
            .filter(|phrase| text.contains(phrase.as_str()))
            .map(|phrase| FallbackSignal::InabilityPhrase(phrase.clone()))
            .collect();

        signals.extend(
            available_capability_names
                .iter()
                .filter(|name| name.trim().chars().count() >= self.min_name_len)
                .filter(|name| text.contains(&normalize(name)))
                .map(|name| FallbackSignal::CapabilityMention(name.clone())),
        );

        signals
    }
}

impl Default for PhraseFallbackDetector {
    fn default() -> Self {
        Self::from_config(&FallbackConfig::default())
    }
}

impl FallbackDetector for PhraseFallbackDetector {
    fn detect_missed_capability_need(
        &self,
        response_text: &str,
        available_capability_names: &[String],
    ) -> bool {
        let signals = self.signals(response_text, available_capability_names);
        if let Some(first) = signals.first() {
            tracing::debug!(signal = %first, total = signals.len(), "Fallback signal detected");
            true
        } else {
            false
        }
    }
}

/// Lowercase, trim, and fold typographic apostrophes.
fn normalize(text: &str) -> String {
    text.trim().to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}
