//! Entry-count and memory ceilings

use crate::config::EffectiveLimits;
use crate::shard::ShardMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use super::traits::EvictionPolicy;

/// Most victims a single write may evict
pub const EVICTION_BATCH_SIZE: usize = 10;

/// Result of enforcing bounds for one incoming entry
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EnforcementOutcome {
    /// Whether the write fits within both ceilings after eviction
    pub within_bounds: bool,
    /// Entries evicted from the receiving shard
    pub evicted: usize,
}

/// Tracks aggregate usage and evicts from the shard receiving a write.
///
/// Counters are updated by whoever holds the affected shard lock; reads of
/// the totals are approximate while writers are active on other shards.
pub struct BoundsEnforcer {
    limits: EffectiveLimits,
    policy: Box<dyn EvictionPolicy>,
    entries: AtomicUsize,
    bytes: AtomicU64,
}

impl BoundsEnforcer {
    pub fn new(limits: EffectiveLimits, policy: Box<dyn EvictionPolicy>) -> Self {
        Self {
            limits,
            policy,
            entries: AtomicUsize::new(0),
            bytes: AtomicU64::new(0),
        }
    }

    pub fn limits(&self) -> EffectiveLimits {
        self.limits
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.load(Ordering::Relaxed)
    }

    pub fn memory_bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    pub fn record_insert(&self, size: usize) {
        self.entries.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(size as u64, Ordering::Relaxed);
    }

    pub fn record_remove(&self, size: usize) {
        // Saturating: clear() and concurrent sweeps may race the counters
        let _ = self
            .entries
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| Some(n.saturating_sub(1)));
        let _ = self
            .bytes
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |b| {
                Some(b.saturating_sub(size as u64))
            });
    }

    pub fn record_bulk_remove(&self, count: usize, bytes: usize) {
        let _ = self
            .entries
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                Some(n.saturating_sub(count))
            });
        let _ = self
            .bytes
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |b| {
                Some(b.saturating_sub(bytes as u64))
            });
    }

    /// Whether one more entry of `incoming` bytes fits both ceilings
    pub fn fits(&self, incoming: usize) -> bool {
        self.entry_count() < self.limits.max_entries
            && self.memory_bytes().saturating_add(incoming as u64) <= self.limits.max_memory_bytes
    }

    /// Fraction of the tighter ceiling currently in use
    pub fn utilization(&self) -> f64 {
        let entries = self.entry_count() as f64 / self.limits.max_entries.max(1) as f64;
        let bytes = self.memory_bytes() as f64 / self.limits.max_memory_bytes.max(1) as f64;
        entries.max(bytes)
    }

    /// Evict from `shard` until an entry of `incoming` bytes fits or the batch is spent.
    ///
    /// The caller holds the shard lock and has already removed any entry the
    /// write is replacing. Never fails; the outcome is for observability.
    pub fn enforce(&self, shard: &mut ShardMap, incoming: usize) -> EnforcementOutcome {
        let mut evicted = 0;
        while !self.fits(incoming) && evicted < EVICTION_BATCH_SIZE {
            match self.policy.evict(shard) {
                Some((key, entry)) => {
                    self.record_remove(entry.size());
                    evicted += 1;
                    tracing::trace!(key = %key, policy = self.policy.name(), "Evicted cache entry");
                }
                None => break,
            }
        }

        let within_bounds = self.fits(incoming);
        if !within_bounds {
            tracing::debug!(
                evicted,
                entries = self.entry_count(),
                bytes = self.memory_bytes(),
                "Write exceeds cache bounds after shard-local eviction"
            );
        }

        EnforcementOutcome {
            within_bounds,
            evicted,
        }
    }
}

impl std::fmt::Debug for BoundsEnforcer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundsEnforcer")
            .field("limits", &self.limits)
            .field("policy", &self.policy.name())
            .field("entries", &self.entry_count())
            .field("bytes", &self.memory_bytes())
            .finish()
    }
}
