//! LRU (Least Recently Used) eviction policy implementation

use crate::entry::CacheEntry;
use crate::eviction::traits::EvictionPolicy;
use crate::shard::ShardMap;

/// LRU (Least Recently Used) eviction policy.
///
/// Recency is tracked by the shard map itself: reads and writes promote a
/// key, so the victim is simply the tail of the shard's access order.
#[derive(Debug, Default, Clone, Copy)]
pub struct LruPolicy;

impl LruPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl EvictionPolicy for LruPolicy {
    fn name(&self) -> &'static str {
        "lru"
    }

    fn evict(&self, entries: &mut ShardMap) -> Option<(String, CacheEntry)> {
        entries.pop_lru()
    }
}
