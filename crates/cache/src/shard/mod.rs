//! Independently locked partitions of the key space

mod router;

pub use router::ShardRouter;

use crate::entry::CacheEntry;
use lru::LruCache;
use parking_lot::{Mutex, MutexGuard};
use std::time::Instant;

/// Access-ordered key → entry map held by one shard
pub type ShardMap = LruCache<String, CacheEntry>;

/// Entries removed by a single shard sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepResult {
    pub removed: usize,
    pub bytes: usize,
}

/// One partition of the cache, guarded by its own mutex.
///
/// The underlying map is unbounded; capacity is enforced by the bounds
/// enforcer across all shards.
pub struct Shard {
    entries: Mutex<ShardMap>,
}

impl Shard {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(LruCache::unbounded()),
        }
    }

    /// Acquire the shard lock
    pub fn lock(&self) -> MutexGuard<'_, ShardMap> {
        self.entries.lock()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry expired at `now`, holding the lock only for this shard
    pub fn sweep_expired(&self, now: Instant) -> SweepResult {
        let mut entries = self.entries.lock();
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        let mut result = SweepResult::default();
        for key in expired {
            if let Some(entry) = entries.pop(&key) {
                result.removed += 1;
                result.bytes += entry.size();
            }
        }
        result
    }
}

impl Default for Shard {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Shard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shard").field("len", &self.len()).finish()
    }
}
