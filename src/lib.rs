//! nexus-gate - Intent-aware capability gating
//!
//! Decides per request whether a tool-augmented completion needs its
//! capability schema at all. A cached, time-boxed classifier runs first; the
//! completion engine is called without capabilities when they are not needed,
//! and a fallback detector issues at most one corrective retry when that call
//! turns out to have needed them after all.
//!
//! # Wiring
//!
//! ```no_run
//! use nexus_gate::cache::ClassificationCache;
//! use nexus_gate::classifier::IntentClassifier;
//! use nexus_gate::config::GateConfig;
//! use nexus_gate::engine::{
//!     CapabilityCatalogResolver, CapabilityExecutor, OpenAiCompatClient,
//! };
//! use nexus_gate::fallback::PhraseFallbackDetector;
//! use nexus_gate::metrics::{spawn_publisher, MetricsCollector, PrometheusSink};
//! use nexus_gate::pipeline::{Collaborators, Orchestrator, PipelineRequest};
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run(
//! #     resolver: Arc<dyn CapabilityCatalogResolver>,
//! #     executor: Arc<dyn CapabilityExecutor>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let config = GateConfig::default();
//! let http = Arc::new(reqwest::Client::new());
//! let aux = OpenAiCompatClient::new(
//!     config.inference.base_url.clone(),
//!     config.inference.classifier_model.clone(),
//!     http.clone(),
//!     Duration::from_millis(config.classifier.timeout_ms),
//! );
//! let engine = OpenAiCompatClient::new(
//!     config.inference.base_url.clone(),
//!     config.inference.completion_model.clone(),
//!     http,
//!     Duration::from_millis(config.pipeline.completion_timeout_ms),
//! );
//!
//! let shutdown = CancellationToken::new();
//! let cache = Arc::new(ClassificationCache::from_config(&config.cache));
//! cache.spawn_sweeper(config.cache.sweep_interval(), shutdown.clone());
//! let metrics = Arc::new(MetricsCollector::from_config(&config.metrics));
//! spawn_publisher(
//!     metrics.clone(),
//!     Arc::new(PrometheusSink),
//!     config.metrics.publish_interval(),
//!     shutdown.clone(),
//! );
//!
//! let classifier = Arc::new(IntentClassifier::new(
//!     Arc::new(aux),
//!     cache,
//!     config.classifier.clone(),
//! ));
//! let orchestrator = Orchestrator::new(
//!     classifier,
//!     Collaborators { resolver, engine: Arc::new(engine), executor },
//!     metrics,
//!     config.pipeline.clone(),
//! )
//! .with_detector(Arc::new(PhraseFallbackDetector::from_config(&config.fallback)))
//! .with_fallback_enabled(config.fallback.enabled)
//! .with_content_logging(config.logging.enable_content_logging);
//!
//! let request = PipelineRequest::new("session-1", "agent-1", "Hi!");
//! let outcome = orchestrator.handle(&request, &CancellationToken::new()).await?;
//! println!("{} via {}", outcome.response, outcome.path);
//! shutdown.cancel();
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod engine;
pub mod fallback;
pub mod logging;
pub mod metrics;
pub mod pipeline;
