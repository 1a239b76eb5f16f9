//! Metrics sinks: where aggregate snapshots are pushed for dashboards and alerting.

use super::{AggregateMetrics, MetricsCollector};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Receiver of aggregate snapshots.
///
/// Implementations must return quickly; they are only ever called from the
/// publisher task, never from request handling.
pub trait MetricsSink: Send + Sync + 'static {
    fn publish(&self, snapshot: &AggregateMetrics);
}

/// Emits snapshot ratios as gauges through the `metrics` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusSink;

impl MetricsSink for PrometheusSink {
    fn publish(&self, snapshot: &AggregateMetrics) {
        metrics::gauge!("gate_cache_hit_ratio").set(snapshot.cache.hit_rate);
        metrics::gauge!("gate_skipped_capability_ratio").set(snapshot.skipped_capability_rate);
        metrics::gauge!("gate_fallback_ratio").set(snapshot.fallback_rate);
        metrics::gauge!("gate_failsafe_ratio").set(snapshot.failsafe_rate);
        for (path, summary) in [
            ("no_capabilities", &snapshot.latency.no_capabilities),
            ("capabilities", &snapshot.latency.capabilities),
            ("fallback", &snapshot.latency.fallback),
        ] {
            metrics::gauge!("gate_latency_p95_ms", "path" => path).set(summary.p95_ms as f64);
        }
    }
}

/// Logs each snapshot as a structured `info` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl MetricsSink for TracingSink {
    fn publish(&self, snapshot: &AggregateMetrics) {
        tracing::info!(
            total_requests = snapshot.total_requests,
            failed_requests = snapshot.failed_requests,
            cache_hit_rate = snapshot.cache.hit_rate,
            skipped_capability_rate = snapshot.skipped_capability_rate,
            fallback_rate = snapshot.fallback_rate,
            failsafe_rate = snapshot.failsafe_rate,
            "Gate metrics snapshot"
        );
    }
}

/// Push a snapshot to `sink` every `interval` until `cancel_token` fires.
pub fn spawn_publisher(
    collector: Arc<MetricsCollector>,
    sink: Arc<dyn MetricsSink>,
    interval: Duration,
    cancel_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    tracing::debug!("Metrics publisher stopped");
                    break;
                }
                _ = ticker.tick() => {
                    sink.publish(&collector.snapshot());
                }
            }
        }
    })
}
