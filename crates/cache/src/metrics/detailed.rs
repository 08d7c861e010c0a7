//! Full operational view of a cache instance

use super::snapshot::MetricsSnapshot;
use crate::config::EffectiveLimits;
use crate::storage::WalStats;
use serde::Serialize;

/// Counters plus size, distribution, limits and durability state
#[derive(Debug, Clone, Serialize)]
pub struct DetailedMetrics {
    #[serde(flatten)]
    pub counters: MetricsSnapshot,
    /// Entries across all shards, including expired ones not yet swept
    pub size: usize,
    /// Estimated bytes tracked by the bounds enforcer
    pub memory_bytes: u64,
    pub shard_count: usize,
    /// Entry count of each shard, by shard index
    pub shard_distribution: Vec<usize>,
    pub limits: EffectiveLimits,
    /// Fraction of the tighter ceiling in use
    pub utilization: f64,
    pub paranoia_mode: bool,
    pub eviction_policy: &'static str,
    pub wal: WalStats,
    pub uptime_secs: f64,
}

impl DetailedMetrics {
    /// Largest shard size over the mean; 1.0 is a perfectly even spread
    pub fn shard_skew(&self) -> f64 {
        let max = self.shard_distribution.iter().copied().max().unwrap_or(0);
        if self.size == 0 || self.shard_count == 0 {
            return 1.0;
        }
        let mean = self.size as f64 / self.shard_count as f64;
        max as f64 / mean
    }

    /// Render as a JSON document for external monitoring
    pub fn to_json(&self) -> serde_json::Value {
        // DetailedMetrics contains only plain data; serialization cannot fail
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
