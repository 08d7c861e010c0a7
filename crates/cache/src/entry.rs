//! Cache entry representation

use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Per-entry bookkeeping overhead added to the size estimate
pub const ENTRY_OVERHEAD_BYTES: usize = 64;

/// A stored value together with its creation time and time-to-live.
///
/// Entries are immutable: overwriting a key replaces the entry wholesale.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    value: Arc<Value>,
    created_at: Instant,
    ttl: Duration,
    size: usize,
}

impl CacheEntry {
    /// Create an entry stamped with the current instant
    pub fn new(value: Value, ttl: Duration, size: usize) -> Self {
        Self::with_created_at(value, ttl, size, Instant::now())
    }

    pub(crate) fn with_created_at(
        value: Value,
        ttl: Duration,
        size: usize,
        created_at: Instant,
    ) -> Self {
        Self {
            value: Arc::new(value),
            created_at,
            ttl,
            size,
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Estimated footprint in bytes, fixed at creation
    pub fn size(&self) -> usize {
        self.size
    }

    /// `created_at + ttl`, saturating at the creation instant on overflow
    pub fn expires_at(&self) -> Instant {
        self.created_at
            .checked_add(self.ttl)
            .unwrap_or(self.created_at)
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at()
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Time left before expiry, zero once expired
    pub fn remaining_ttl(&self, now: Instant) -> Duration {
        self.expires_at().saturating_duration_since(now)
    }
}

/// Estimate the in-memory footprint of a key/value pair.
///
/// Falls back to the fixed overhead when the value cannot be serialized.
pub fn estimate_size(key: &str, value: &Value) -> usize {
    let value_len = match serde_json::to_vec(value) {
        Ok(bytes) => bytes.len(),
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to estimate cache entry size");
            0
        }
    };
    key.len() + value_len + ENTRY_OVERHEAD_BYTES
}
