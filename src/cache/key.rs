//! Cache key derivation.

use sha2::{Digest, Sha256};

/// Normalize message text before fingerprinting.
pub fn normalize_message(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Derive the cache key for a message scoped to an agent.
///
/// The agent id is length-prefixed so `("ab", "c")` and `("a", "bc")`
/// never hash the same input.
pub fn cache_key(agent_id: &str, message: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update((agent_id.len() as u64).to_le_bytes());
    hasher.update(agent_id.as_bytes());
    hasher.update(normalize_message(message).as_bytes());
    format!("{:x}", hasher.finalize())
}
