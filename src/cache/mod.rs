//! # Classification Cache
//!
//! Bounded, time-expiring store mapping a message fingerprint to a previously
//! computed [`ClassificationDecision`].
//!
//! - Entries past their expiry are never returned; they are evicted on access
//!   or by the background sweeper.
//! - When full, the least-recently-used entry is evicted before inserting.
//! - All operations take one short-held mutex. No I/O ever happens while the
//!   lock is held.

pub mod error;
pub mod key;

pub use error::CacheError;
pub use key::{cache_key, normalize_message};

use crate::classifier::ClassificationDecision;
use crate::config::{CacheConfig, MAX_TTL_SECONDS};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Longest lifetime an entry can have; larger TTLs are clamped to it.
pub const MAX_TTL: Duration = Duration::from_secs(MAX_TTL_SECONDS);

/// Storage seam for classification decisions.
///
/// Injected into the classifier so tests can substitute failing or counting
/// implementations.
pub trait DecisionCache: Send + Sync + 'static {
    /// Return a live decision for `key`, or `None` on miss/expiry.
    fn get(&self, key: &str) -> Result<Option<ClassificationDecision>, CacheError>;

    /// Insert or overwrite `key`, evicting the LRU entry when full.
    fn put(
        &self,
        key: String,
        decision: ClassificationDecision,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    fn stats(&self) -> CacheStats;

    /// TTL applied by callers that have no better value.
    fn default_ttl(&self) -> Duration;
}

/// Observability counters for a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hit_count: u64,
    pub miss_count: u64,
    pub eviction_count: u64,
}

impl CacheStats {
    /// Hits over lookups, 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

/// A cached decision with its lifetime.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub decision: ClassificationDecision,
    pub created_at: Instant,
    pub expires_at: Instant,
}

impl CacheEntry {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

struct Slot {
    entry: CacheEntry,
    last_used: u64,
}

/// Entries plus a recency index (access tick → key).
#[derive(Default)]
struct CacheState {
    entries: HashMap<String, Slot>,
    recency: BTreeMap<u64, String>,
    tick: u64,
}

impl CacheState {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn touch(&mut self, key: &str) -> Option<ClassificationDecision> {
        let tick = self.next_tick();
        let slot = self.entries.get_mut(key)?;
        self.recency.remove(&slot.last_used);
        slot.last_used = tick;
        self.recency.insert(tick, key.to_string());
        Some(slot.entry.decision.clone())
    }

    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let slot = self.entries.remove(key)?;
        self.recency.remove(&slot.last_used);
        Some(slot.entry)
    }

    fn insert(&mut self, entry: CacheEntry) {
        let tick = self.next_tick();
        self.remove(&entry.key);
        self.recency.insert(tick, entry.key.clone());
        self.entries.insert(
            entry.key.clone(),
            Slot {
                entry,
                last_used: tick,
            },
        );
    }

    fn evict_lru(&mut self) -> Option<String> {
        let (_, key) = self.recency.pop_first()?;
        self.entries.remove(&key);
        Some(key)
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }
}

/// In-process LRU + TTL classification cache.
///
/// Created once per process and shared by `Arc` into the classifier.
pub struct ClassificationCache {
    state: Mutex<CacheState>,
    default_ttl: Duration,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl ClassificationCache {
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            default_ttl,
            max_entries: max_entries.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_entries, config.ttl())
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn len(&self) -> usize {
        self.lock().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` holds an entry, live or not, without touching recency.
    pub fn contains(&self, key: &str) -> bool {
        self.lock()
            .map(|s| s.entries.contains_key(key))
            .unwrap_or(false)
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        if let Ok(mut state) = self.lock() {
            state.clear();
        }
    }

    /// Remove all expired entries, returning how many were dropped.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let Ok(mut state) = self.lock() else {
            return 0;
        };
        let expired: Vec<String> = state
            .entries
            .values()
            .filter(|slot| slot.entry.is_expired(now))
            .map(|slot| slot.entry.key.clone())
            .collect();
        for key in &expired {
            state.remove(key);
        }
        expired.len()
    }

    /// Periodically sweep expired entries until `cancel_token` fires.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        cancel_token: CancellationToken,
    ) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        tracing::debug!("Classification cache sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let removed = cache.sweep_expired();
                        if removed > 0 {
                            tracing::debug!(removed, "Swept expired classification entries");
                        }
                    }
                }
            }
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, CacheState>, CacheError> {
        match self.state.lock() {
            Ok(guard) => Ok(guard),
            Err(poisoned) => {
                tracing::warn!("Classification cache lock poisoned, resetting store");
                poisoned.into_inner().clear();
                self.state.clear_poison();
                Err(CacheError::Poisoned)
            }
        }
    }
}

impl DecisionCache for ClassificationCache {
    fn get(&self, key: &str) -> Result<Option<ClassificationDecision>, CacheError> {
        let now = Instant::now();
        let mut state = self.lock()?;

        let expired = match state.entries.get(key) {
            Some(slot) => slot.entry.is_expired(now),
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return Ok(None);
            }
        };

        if expired {
            state.remove(key);
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        }

        let decision = state.touch(key);
        self.hits.fetch_add(1, Ordering::Relaxed);
        Ok(decision)
    }

    fn put(
        &self,
        key: String,
        decision: ClassificationDecision,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let now = Instant::now();
        let expires_at = now.checked_add(ttl.min(MAX_TTL)).unwrap_or(now);
        let entry = CacheEntry {
            key,
            decision,
            created_at: now,
            expires_at,
        };

        let mut state = self.lock()?;
        if !state.entries.contains_key(&entry.key) && state.entries.len() >= self.max_entries {
            if let Some(evicted) = state.evict_lru() {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(key = %evicted, "Evicted least-recently-used classification");
            }
        }
        state.insert(entry);
        Ok(())
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.len(),
            max_size: self.max_entries,
            hit_count: self.hits.load(Ordering::Relaxed),
            miss_count: self.misses.load(Ordering::Relaxed),
            eviction_count: self.evictions.load(Ordering::Relaxed),
        }
    }

    fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}
