//! Whole-cache operations: clear, size and expiry sweeps

use std::time::Instant;

use crate::core::types::{Origin, ShardedCache};

impl ShardedCache {
    /// Remove every entry, locking one shard at a time. Returns how many were dropped.
    ///
    /// Not linearizable: writers active on other shards may land before or
    /// after their shard is emptied.
    pub fn clear(&self) -> usize {
        let removed = self.inner.clear_shards(Origin::Live);
        tracing::debug!(removed, "Cleared cache");
        removed
    }

    /// Entries across all shards at the time each shard was counted.
    ///
    /// Includes expired entries that have not been swept or read yet.
    pub fn size(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn shard_count(&self) -> usize {
        self.inner.shards.len()
    }

    /// Shard index `key` routes to
    pub fn shard_for(&self, key: &str) -> usize {
        self.inner.router.route(key)
    }

    /// Sweep every shard for expired entries once, returning how many were removed
    pub fn run_cleanup(&self) -> usize {
        let now = Instant::now();
        (0..self.inner.shards.len())
            .map(|index| self.inner.sweep_shard(index, now).removed)
            .sum()
    }

    /// Whether the background cleanup task is running
    pub fn cleanup_running(&self) -> bool {
        self.inner
            .cleanup
            .lock()
            .as_ref()
            .is_some_and(|scheduler| scheduler.is_running())
    }

    /// Stop the background cleanup task, waiting for its current sweep to finish
    pub async fn stop_cleanup(&self) {
        let scheduler = self.inner.cleanup.lock().take();
        if let Some(scheduler) = scheduler {
            scheduler.stop().await;
        }
    }

    /// Stop background work and close the write-ahead log.
    ///
    /// The cache keeps serving from memory afterwards; later mutations are
    /// reported through the degraded WAL signal.
    pub async fn shutdown(&self) -> crate::errors::Result<()> {
        self.stop_cleanup().await;
        match self.inner.wal.as_ref() {
            Some(wal) => wal.close(),
            None => Ok(()),
        }
    }
}
