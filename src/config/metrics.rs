//! Metrics collector configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Latency samples kept per path for percentiles
    pub window_size: usize,
    /// Seconds between snapshot pushes to the metrics sink
    pub publish_interval_seconds: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            window_size: 1000,
            publish_interval_seconds: 15,
        }
    }
}

impl MetricsConfig {
    pub fn publish_interval(&self) -> Duration {
        Duration::from_secs(self.publish_interval_seconds)
    }
}
