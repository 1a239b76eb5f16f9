//! Classification cache configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest TTL a classification may be cached for (one year).
pub const MAX_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;

/// Bounds and lifetime of the classification cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds a decision stays valid
    pub ttl_seconds: u64,
    /// Maximum number of cached decisions
    pub max_entries: usize,
    /// Seconds between background sweeps of expired entries
    pub sweep_interval_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 300,
            max_entries: 1000,
            sweep_interval_seconds: 60,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }
}
