//! Cache error types

use thiserror::Error;

/// Classification cache failures. Never fatal to a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// A writer panicked while holding the lock; the store has been reset.
    #[error("cache lock poisoned, store reset")]
    Poisoned,

    /// The cache implementation could not serve the call.
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}
