//! # Metrics Types
//!
//! Read-only aggregate views derived from the collector's counters.

use serde::Serialize;

/// Aggregate pipeline figures at a point in time.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AggregateMetrics {
    /// Seconds since the collector was created
    pub uptime_seconds: u64,
    /// Requests that reached a final response
    pub total_requests: u64,
    /// Requests that ended in a request-level error
    pub failed_requests: u64,
    /// Classification cache figures
    pub cache: CacheMetrics,
    /// Fraction of requests answered without loading capabilities (0.0–1.0)
    pub skipped_capability_rate: f64,
    /// Fraction of requests that needed a fallback retry (0.0–1.0)
    pub fallback_rate: f64,
    /// Fraction of requests classified with the fail-safe decision (0.0–1.0)
    pub failsafe_rate: f64,
    /// Requests whose completion executed at least one capability
    pub capability_executions: u64,
    /// Latency per path
    pub latency: PathLatencies,
    /// Per-agent breakdown, sorted by agent id
    pub agents: Vec<AgentStats>,
}

/// Classifier cache lookups as seen by completed requests.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Default)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

/// Latency summaries split by pipeline path.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct PathLatencies {
    pub no_capabilities: LatencySummary,
    pub capabilities: LatencySummary,
    pub fallback: LatencySummary,
}

/// Summary of a rolling latency window.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Default)]
pub struct LatencySummary {
    pub samples: usize,
    pub average_ms: f64,
    pub p50_ms: u64,
    pub p95_ms: u64,
    pub p99_ms: u64,
    pub max_ms: u64,
}

/// Per-agent counters.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub struct AgentStats {
    pub agent_id: String,
    pub requests: u64,
    pub cache_hits: u64,
    pub capability_loads: u64,
    pub fallbacks: u64,
    pub failures: u64,
}

/// Divide, returning 0.0 for an empty denominator.
pub(crate) fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
