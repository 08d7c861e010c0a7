//! Core eviction policy trait definition

use crate::entry::CacheEntry;
use crate::shard::ShardMap;

/// Chooses victims within a single shard
pub trait EvictionPolicy: Send + Sync {
    /// Policy name as used in configuration
    fn name(&self) -> &'static str;

    /// Remove and return the next victim from `entries`, if any
    fn evict(&self, entries: &mut ShardMap) -> Option<(String, CacheEntry)>;
}
