//! # Intent Classifier
//!
//! Decides, before the main completion call, whether a request needs its
//! capability set. One cached, time-boxed auxiliary inference call per
//! distinct `(agent, normalized message)`.
//!
//! The classifier never returns an error. Timeouts, transport failures and
//! unparseable output all resolve to [`ClassificationDecision::fail_safe`],
//! which loads capabilities.

pub mod parse;
pub mod prompt;
pub mod types;

pub use parse::{parse_decision, ParseError, ParsedDecision};
pub use types::{ClassificationDecision, Confidence, DecisionSource, FAILSAFE_RATIONALE};

use crate::cache::{cache_key, DecisionCache};
use crate::config::ClassifierConfig;
use crate::engine::AuxiliaryInference;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Cache-fronted intent classifier.
pub struct IntentClassifier {
    inference: Arc<dyn AuxiliaryInference>,
    cache: Arc<dyn DecisionCache>,
    config: ClassifierConfig,
    inference_calls: AtomicU64,
}

impl IntentClassifier {
    pub fn new(
        inference: Arc<dyn AuxiliaryInference>,
        cache: Arc<dyn DecisionCache>,
        config: ClassifierConfig,
    ) -> Self {
        Self {
            inference,
            cache,
            config,
            inference_calls: AtomicU64::new(0),
        }
    }

    /// Shared cache handle.
    pub fn cache(&self) -> &Arc<dyn DecisionCache> {
        &self.cache
    }

    /// Number of auxiliary inference calls issued so far.
    pub fn inference_calls(&self) -> u64 {
        self.inference_calls.load(Ordering::Relaxed)
    }

    /// Classify `message` for `agent_id`.
    ///
    /// Cache hits return immediately with `source = Cache`. Misses issue one
    /// auxiliary call bounded by `timeout_ms`; its validated result is cached
    /// for the cache's default TTL. Fail-safe decisions are never cached.
    pub async fn classify(&self, message: &str, agent_id: &str) -> ClassificationDecision {
        let start = Instant::now();
        let key = cache_key(agent_id, message);

        if self.config.cache_enabled {
            match self.cache.get(&key) {
                Ok(Some(mut decision)) => {
                    decision.source = DecisionSource::Cache;
                    tracing::debug!(
                        agent_id,
                        requires_capabilities = decision.requires_capabilities,
                        "Classification cache hit"
                    );
                    return decision;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(agent_id, error = %e, "Classification cache read failed, treating as miss");
                }
            }
        }

        let prompt = prompt::build_prompt(message, self.config.max_message_chars);
        let timeout = Duration::from_millis(self.config.timeout_ms);
        self.inference_calls.fetch_add(1, Ordering::Relaxed);
        let result = tokio::time::timeout(timeout, self.inference.infer(&prompt)).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let parsed = match result {
            Err(_) => {
                tracing::warn!(
                    agent_id,
                    timeout_ms = self.config.timeout_ms,
                    "Classification timed out, using fail-safe decision"
                );
                return ClassificationDecision::fail_safe(elapsed_ms);
            }
            Ok(Err(e)) => {
                tracing::warn!(agent_id, error = %e, "Classification call failed, using fail-safe decision");
                return ClassificationDecision::fail_safe(elapsed_ms);
            }
            Ok(Ok(raw)) => match parse_decision(&raw) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!(agent_id, error = %e, "Classification output rejected, using fail-safe decision");
                    return ClassificationDecision::fail_safe(elapsed_ms);
                }
            },
        };

        let mut decision = ClassificationDecision {
            requires_capabilities: parsed.requires_capabilities,
            confidence: parsed.confidence,
            rationale: parsed.rationale,
            suggested_capability_names: parsed.suggested_capability_names,
            elapsed_ms,
            source: DecisionSource::Model,
        };

        if self.config.escalate_low_confidence
            && !decision.requires_capabilities
            && decision.confidence == Confidence::Low
        {
            tracing::debug!(agent_id, "Escalating low-confidence skip to capability load");
            decision.requires_capabilities = true;
        }

        tracing::debug!(
            agent_id,
            requires_capabilities = decision.requires_capabilities,
            confidence = %decision.confidence,
            rationale = %decision.rationale,
            elapsed_ms,
            "Classified request"
        );

        if self.config.cache_enabled {
            let ttl = self.cache.default_ttl();
            if let Err(e) = self.cache.put(key, decision.clone(), ttl) {
                tracing::warn!(agent_id, error = %e, "Classification cache write failed");
            }
        }

        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheError, CacheStats, ClassificationCache};
    use crate::engine::{AuxiliaryPrompt, EngineError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Auxiliary double returning a fixed reply and counting calls.
    struct ScriptedInference {
        reply: Result<String, EngineError>,
        delay: Duration,
        calls: AtomicU64,
    }

    impl ScriptedInference {
        fn ok(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                delay: Duration::ZERO,
                calls: AtomicU64::new(0),
            })
        }

        fn failing(err: EngineError) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(err),
                delay: Duration::ZERO,
                calls: AtomicU64::new(0),
            })
        }

        fn slow(reply: &str, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                delay,
                calls: AtomicU64::new(0),
            })
        }

        fn calls(&self) -> u64 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AuxiliaryInference for ScriptedInference {
        async fn infer(&self, _prompt: &AuxiliaryPrompt) -> Result<String, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.reply.clone()
        }
    }

    /// Cache double whose every operation fails.
    struct BrokenCache {
        puts: Mutex<u32>,
    }

    impl DecisionCache for BrokenCache {
        fn get(&self, _key: &str) -> Result<Option<ClassificationDecision>, CacheError> {
            Err(CacheError::Unavailable("down".to_string()))
        }

        fn put(
            &self,
            _key: String,
            _decision: ClassificationDecision,
            _ttl: Duration,
        ) -> Result<(), CacheError> {
            *self.puts.lock().unwrap() += 1;
            Err(CacheError::Unavailable("down".to_string()))
        }

        fn stats(&self) -> CacheStats {
            CacheStats::default()
        }

        fn default_ttl(&self) -> Duration {
            Duration::from_secs(300)
        }
    }

    const SKIP: &str = r#"{"requires_capabilities": false, "confidence": "high", "rationale": "greeting"}"#;
    const LOAD: &str = r#"{"requires_capabilities": true, "confidence": "high", "rationale": "sends email", "suggested_capabilities": ["send_email"]}"#;

    fn classifier(inference: Arc<ScriptedInference>) -> IntentClassifier {
        let cache = Arc::new(ClassificationCache::new(100, Duration::from_secs(300)));
        IntentClassifier::new(inference, cache, ClassifierConfig::default())
    }

    #[tokio::test]
    async fn test_model_decision_is_returned_and_cached() {
        let inference = ScriptedInference::ok(LOAD);
        let classifier = classifier(inference.clone());

        let decision = classifier
            .classify("Send an email to j@example.com about the meeting", "agent-1")
            .await;

        assert!(decision.requires_capabilities);
        assert_eq!(decision.source, DecisionSource::Model);
        assert_eq!(decision.suggested_capability_names, vec!["send_email"]);
        assert_eq!(classifier.cache().stats().size, 1);
        assert_eq!(inference.calls(), 1);
    }

    #[tokio::test]
    async fn test_repeat_within_ttl_is_served_from_cache() {
        let inference = ScriptedInference::ok(SKIP);
        let classifier = classifier(inference.clone());

        let first = classifier.classify("Hi!", "agent-1").await;
        let second = classifier.classify("  hi! ", "agent-1").await;

        assert_eq!(inference.calls(), 1);
        assert_eq!(second.source, DecisionSource::Cache);
        assert_eq!(first.requires_capabilities, second.requires_capabilities);
        assert_eq!(first.elapsed_ms, second.elapsed_ms);
        assert_eq!(classifier.inference_calls(), 1);
    }

    #[tokio::test]
    async fn test_other_agent_is_classified_separately() {
        let inference = ScriptedInference::ok(SKIP);
        let classifier = classifier(inference.clone());

        classifier.classify("Hi!", "agent-1").await;
        classifier.classify("Hi!", "agent-2").await;

        assert_eq!(inference.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_triggers_fresh_classification() {
        let inference = ScriptedInference::ok(SKIP);
        let classifier = classifier(inference.clone());

        classifier.classify("Hi!", "agent-1").await;
        tokio::time::advance(Duration::from_secs(301)).await;
        let decision = classifier.classify("Hi!", "agent-1").await;

        assert_eq!(inference.calls(), 2);
        assert_eq!(decision.source, DecisionSource::Model);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_yields_fail_safe() {
        let inference = ScriptedInference::slow(SKIP, Duration::from_secs(10));
        let classifier = classifier(inference.clone());

        let decision = classifier.classify("Hi!", "agent-1").await;

        assert!(decision.requires_capabilities);
        assert_eq!(decision.confidence, Confidence::Low);
        assert_eq!(decision.rationale, FAILSAFE_RATIONALE);
        assert!(decision.is_fail_safe());
        // Fail-safe decisions are not cached
        assert_eq!(classifier.cache().stats().size, 0);
    }

    #[tokio::test]
    async fn test_call_error_yields_fail_safe() {
        let inference = ScriptedInference::failing(EngineError::Network("refused".to_string()));
        let classifier = classifier(inference);

        let decision = classifier.classify("Hi!", "agent-1").await;
        assert!(decision.is_fail_safe());
        assert!(decision.requires_capabilities);
    }

    #[tokio::test]
    async fn test_unparseable_output_yields_fail_safe() {
        let inference = ScriptedInference::ok("Sure! This is a greeting.");
        let classifier = classifier(inference);

        let decision = classifier.classify("Hi!", "agent-1").await;
        assert!(decision.is_fail_safe());
    }

    #[tokio::test]
    async fn test_low_confidence_skip_is_escalated() {
        let inference = ScriptedInference::ok(
            r#"{"requires_capabilities": false, "confidence": "low", "rationale": "unclear"}"#,
        );
        let classifier = classifier(inference);

        let decision = classifier.classify("Can you help me?", "agent-1").await;
        assert!(decision.requires_capabilities);
        assert_eq!(decision.confidence, Confidence::Low);
        assert!(!decision.is_fail_safe());
    }

    #[tokio::test]
    async fn test_low_confidence_skip_kept_when_escalation_disabled() {
        let inference = ScriptedInference::ok(
            r#"{"requires_capabilities": false, "confidence": "low", "rationale": "unclear"}"#,
        );
        let cache = Arc::new(ClassificationCache::new(100, Duration::from_secs(300)));
        let config = ClassifierConfig {
            escalate_low_confidence: false,
            ..ClassifierConfig::default()
        };
        let classifier = IntentClassifier::new(inference, cache, config);

        let decision = classifier.classify("Can you help me?", "agent-1").await;
        assert!(!decision.requires_capabilities);
    }

    #[tokio::test]
    async fn test_broken_cache_is_not_fatal() {
        let inference = ScriptedInference::ok(SKIP);
        let cache = Arc::new(BrokenCache {
            puts: Mutex::new(0),
        });
        let classifier =
            IntentClassifier::new(inference.clone(), cache.clone(), ClassifierConfig::default());

        let first = classifier.classify("Hi!", "agent-1").await;
        let second = classifier.classify("Hi!", "agent-1").await;

        assert!(!first.requires_capabilities);
        assert!(!second.requires_capabilities);
        assert_eq!(inference.calls(), 2);
        assert_eq!(*cache.puts.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_cache_disabled_always_calls_model() {
        let inference = ScriptedInference::ok(SKIP);
        let cache = Arc::new(ClassificationCache::new(100, Duration::from_secs(300)));
        let config = ClassifierConfig {
            cache_enabled: false,
            ..ClassifierConfig::default()
        };
        let classifier = IntentClassifier::new(inference.clone(), cache, config);

        classifier.classify("Hi!", "agent-1").await;
        classifier.classify("Hi!", "agent-1").await;
        assert_eq!(inference.calls(), 2);
    }
}
