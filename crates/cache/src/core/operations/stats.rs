//! Cache statistics operations

use crate::metrics::{CacheMetrics, DetailedMetrics};
use crate::storage::WalStats;

use crate::core::types::ShardedCache;

impl ShardedCache {
    /// Counters, size, per-shard distribution, limits and durability state
    pub fn get_detailed_metrics(&self) -> DetailedMetrics {
        let inner = &self.inner;
        let shard_distribution = inner.shard_distribution();

        DetailedMetrics {
            counters: inner.metrics.snapshot(),
            size: shard_distribution.iter().sum(),
            memory_bytes: inner.bounds.memory_bytes(),
            shard_count: shard_distribution.len(),
            shard_distribution,
            limits: inner.bounds.limits(),
            utilization: inner.bounds.utilization(),
            paranoia_mode: inner.config.paranoia_mode,
            eviction_policy: inner.bounds.policy_name(),
            wal: self.wal_stats(),
            uptime_secs: inner.metrics.uptime().as_secs_f64(),
        }
    }

    /// Live counters
    pub fn metrics(&self) -> &CacheMetrics {
        &self.inner.metrics
    }

    /// Durability state. A log that failed to open or replay reports
    /// `degraded` with the reason in `error`.
    pub fn wal_stats(&self) -> WalStats {
        let inner = &self.inner;
        let mut stats = inner.wal.as_ref().map(|wal| wal.stats()).unwrap_or_default();

        if let Some(reason) = inner.wal_fault.get() {
            stats.enabled = false;
            stats.degraded = true;
            stats.error = Some(reason.clone());
            if stats.path.is_none() {
                stats.path = inner.config.wal.as_ref().map(|wal| wal.path.clone());
            }
        }
        stats
    }
}
