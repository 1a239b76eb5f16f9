//! # Metrics Collection Module
//!
//! Records every pipeline outcome and derives aggregate figures from the
//! accumulated counters.
//!
//! ## Metrics Emitted
//!
//! **Counters:**
//! - `gate_requests_total{path}` - Completed requests by pipeline path
//! - `gate_request_errors_total{kind}` - Request-level failures
//! - `gate_classifier_cache_total{result}` - Classification cache hits/misses
//! - `gate_fallbacks_total` - Fallback retries
//! - `gate_classification_failsafe_total` - Fail-safe classifications
//!
//! **Histograms:**
//! - `gate_request_duration_seconds{path}` - End-to-end request duration
//! - `gate_classification_duration_seconds` - Classification latency
//!
//! **Gauges** (published by [`PrometheusSink`]):
//! - `gate_cache_hit_ratio`, `gate_skipped_capability_ratio`, `gate_fallback_ratio`

pub mod sink;
pub mod types;
pub mod window;

pub use sink::{spawn_publisher, MetricsSink, PrometheusSink, TracingSink};
pub use types::*;
pub use window::LatencyWindow;

use crate::config::MetricsConfig;
use crate::pipeline::{PipelineError, PipelineOutcome, PipelinePath};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Central accumulator for pipeline outcomes.
///
/// Counters are atomics and per-agent figures live in a `DashMap`; no raw
/// per-request history is kept beyond the bounded latency windows.
pub struct MetricsCollector {
    start_time: Instant,
    requests: AtomicU64,
    failures: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    skipped: AtomicU64,
    fallbacks: AtomicU64,
    failsafes: AtomicU64,
    executions: AtomicU64,
    no_capability_latency: LatencyWindow,
    capability_latency: LatencyWindow,
    fallback_latency: LatencyWindow,
    agents: DashMap<String, AgentStats>,
}

impl MetricsCollector {
    pub fn new(window_size: usize) -> Self {
        Self {
            start_time: Instant::now(),
            requests: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            fallbacks: AtomicU64::new(0),
            failsafes: AtomicU64::new(0),
            executions: AtomicU64::new(0),
            no_capability_latency: LatencyWindow::new(window_size),
            capability_latency: LatencyWindow::new(window_size),
            fallback_latency: LatencyWindow::new(window_size),
            agents: DashMap::new(),
        }
    }

    pub fn from_config(config: &MetricsConfig) -> Self {
        Self::new(config.window_size)
    }

    fn window(&self, path: PipelinePath) -> &LatencyWindow {
        match path {
            PipelinePath::NoCapabilities => &self.no_capability_latency,
            PipelinePath::Capabilities => &self.capability_latency,
            PipelinePath::Fallback => &self.fallback_latency,
        }
    }

    /// Record a completed request.
    pub fn record(&self, outcome: &PipelineOutcome) {
        let path = outcome.path.as_str();
        self.requests.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("gate_requests_total", "path" => path).increment(1);
        metrics::histogram!("gate_request_duration_seconds", "path" => path)
            .record(outcome.timings.total_ms as f64 / 1000.0);
        metrics::histogram!("gate_classification_duration_seconds")
            .record(outcome.timings.classification_ms as f64 / 1000.0);

        let cache_hit = outcome.cache_hit();
        if cache_hit {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("gate_classifier_cache_total", "result" => "hit").increment(1);
        } else {
            self.cache_misses.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("gate_classifier_cache_total", "result" => "miss").increment(1);
        }

        if !outcome.capabilities_loaded {
            self.skipped.fetch_add(1, Ordering::Relaxed);
        }
        if outcome.fallback_triggered {
            self.fallbacks.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("gate_fallbacks_total").increment(1);
        }
        if outcome.decision.is_fail_safe() {
            self.failsafes.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("gate_classification_failsafe_total").increment(1);
        }
        if outcome.capabilities_executed {
            self.executions.fetch_add(1, Ordering::Relaxed);
        }

        self.window(outcome.path).push(outcome.timings.total_ms);

        let mut agent = self
            .agents
            .entry(outcome.agent_id.clone())
            .or_insert_with(|| AgentStats {
                agent_id: outcome.agent_id.clone(),
                ..AgentStats::default()
            });
        agent.requests += 1;
        if cache_hit {
            agent.cache_hits += 1;
        }
        if outcome.capabilities_loaded {
            agent.capability_loads += 1;
        }
        if outcome.fallback_triggered {
            agent.fallbacks += 1;
        }
    }

    /// Record a request that ended in a request-level error.
    pub fn record_failure(&self, agent_id: &str, error: &PipelineError) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("gate_request_errors_total", "kind" => error.kind()).increment(1);

        let mut agent = self
            .agents
            .entry(agent_id.to_string())
            .or_insert_with(|| AgentStats {
                agent_id: agent_id.to_string(),
                ..AgentStats::default()
            });
        agent.failures += 1;
    }

    /// Derive aggregate figures from the current counters.
    pub fn snapshot(&self) -> AggregateMetrics {
        let total = self.requests.load(Ordering::Relaxed);
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let misses = self.cache_misses.load(Ordering::Relaxed);

        let mut agents: Vec<AgentStats> = self.agents.iter().map(|e| e.value().clone()).collect();
        agents.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));

        AggregateMetrics {
            uptime_seconds: self.start_time.elapsed().as_secs(),
            total_requests: total,
            failed_requests: self.failures.load(Ordering::Relaxed),
            cache: CacheMetrics {
                hits,
                misses,
                hit_rate: ratio(hits, hits + misses),
            },
            skipped_capability_rate: ratio(self.skipped.load(Ordering::Relaxed), total),
            fallback_rate: ratio(self.fallbacks.load(Ordering::Relaxed), total),
            failsafe_rate: ratio(self.failsafes.load(Ordering::Relaxed), total),
            capability_executions: self.executions.load(Ordering::Relaxed),
            latency: PathLatencies {
                no_capabilities: self.no_capability_latency.summary(),
                capabilities: self.capability_latency.summary(),
                fallback: self.fallback_latency.summary(),
            },
            agents,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::from_config(&MetricsConfig::default())
    }
}

/// Initialize Prometheus metrics exporter with custom histogram buckets.
///
/// Request buckets cover tool-augmented completions (seconds);
/// classification buckets are tighter since the auxiliary call is meant to be fast.
pub fn setup_metrics(
) -> Result<metrics_exporter_prometheus::PrometheusHandle, Box<dyn std::error::Error>> {
    use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};

    let request_buckets = &[
        0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0,
    ];
    let classification_buckets = &[0.001, 0.005, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 3.0];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("gate_request_duration_seconds".to_string()),
            request_buckets,
        )?
        .set_buckets_for_metric(
            Matcher::Full("gate_classification_duration_seconds".to_string()),
            classification_buckets,
        )?
        .install_recorder()?;

    Ok(handle)
}
