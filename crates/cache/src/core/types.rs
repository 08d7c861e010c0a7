//! Core cache types and structures

use crate::cleanup::CleanupScheduler;
use crate::config::CacheConfig;
use crate::eviction::BoundsEnforcer;
use crate::metrics::CacheMetrics;
use crate::shard::{Shard, ShardRouter};
use crate::storage::WriteAheadLog;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::sync::Arc;

/// Sharded, TTL-bounded in-process cache.
///
/// Cloning is cheap and every clone addresses the same shards.
#[derive(Clone)]
pub struct ShardedCache {
    pub(crate) inner: Arc<CacheInner>,
}

pub(crate) struct CacheInner {
    /// Configuration the cache was built with
    pub config: CacheConfig,
    /// Key → shard mapping
    pub router: ShardRouter,
    /// Independently locked partitions
    pub shards: Vec<Shard>,
    /// Global ceilings and per-shard eviction
    pub bounds: BoundsEnforcer,
    /// Operation counters
    pub metrics: CacheMetrics,
    /// Durable mutation log
    pub wal: Option<WriteAheadLog>,
    /// Set when the log could not be opened or replayed; appends are skipped
    pub wal_fault: OnceCell<String>,
    /// Background expiry sweep, aborted when dropped
    pub cleanup: Mutex<Option<CleanupScheduler>>,
}

/// Where a mutation comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    /// Caller-initiated: logged to the WAL and counted in metrics
    Live,
    /// Rebuilt from the WAL on open: neither logged nor counted
    Replay,
}

impl std::fmt::Debug for ShardedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedCache")
            .field("shard_count", &self.inner.shards.len())
            .field("entry_count", &self.inner.bounds.entry_count())
            .field("wal", &self.inner.wal.as_ref().map(|w| w.path()))
            .finish()
    }
}
