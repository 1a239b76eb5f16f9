//! Bounded rolling window of latency samples.

use super::types::LatencySummary;
use std::collections::VecDeque;
use std::sync::RwLock;

/// Ring buffer of the most recent latency samples (milliseconds).
pub struct LatencyWindow {
    samples: RwLock<VecDeque<u64>>,
    capacity: usize,
}

impl LatencyWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Add a sample, evicting the oldest if at capacity.
    pub fn push(&self, value_ms: u64) {
        let mut samples = match self.samples.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if samples.len() >= self.capacity {
            samples.pop_front();
        }
        samples.push_back(value_ms);
    }

    pub fn len(&self) -> usize {
        self.samples.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Average and nearest-rank percentiles over the current window.
    pub fn summary(&self) -> LatencySummary {
        let mut sorted: Vec<u64> = match self.samples.read() {
            Ok(guard) => guard.iter().copied().collect(),
            Err(poisoned) => poisoned.into_inner().iter().copied().collect(),
        };
        if sorted.is_empty() {
            return LatencySummary::default();
        }
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        LatencySummary {
            samples: count,
            average_ms: sum as f64 / count as f64,
            p50_ms: percentile(&sorted, 50.0),
            p95_ms: percentile(&sorted, 95.0),
            p99_ms: percentile(&sorted, 99.0),
            max_ms: sorted[count - 1],
        }
    }
}

fn percentile(sorted: &[u64], pct: f64) -> u64 {
    let rank = ((pct / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}
