//! Shard-level primitives shared by the public operations, replay, restore and rollback
//!
//! Every mutation takes exactly one shard lock. When the mutation is live the
//! WAL append happens under that lock and before the map changes, so the log
//! order matches the order in which each shard applied its writes.

use crate::entry::{estimate_size, CacheEntry};
use crate::errors::Result;
use crate::shard::SweepResult;
use crate::storage::{WalOperation, WriteAheadLog};
use serde_json::Value;
use std::time::{Duration, Instant};

use super::types::{CacheInner, Origin};

impl CacheInner {
    /// Log `op` if a WAL is configured. Failures are counted and logged, never returned.
    pub(crate) fn log_mutation<F>(&self, op: F)
    where
        F: FnOnce() -> Result<WalOperation>,
    {
        let Some(wal) = self.active_wal() else {
            return;
        };

        match op().and_then(|op| wal.append(&op)) {
            Ok(_) => self.metrics.record_wal_append(),
            Err(e) => {
                self.metrics.record_wal_failure();
                tracing::warn!(
                    path = %wal.path().display(),
                    error = %e,
                    "WAL append failed; continuing without durability"
                );
            }
        }
    }

    /// The log, unless durability was switched off at startup
    pub(crate) fn active_wal(&self) -> Option<&WriteAheadLog> {
        if self.wal_fault.get().is_some() {
            return None;
        }
        self.wal.as_ref()
    }

    /// Whether durability is lost or appends are currently failing
    pub(crate) fn wal_degraded(&self) -> bool {
        self.wal_fault.get().is_some() || self.wal.as_ref().is_some_and(|wal| wal.is_degraded())
    }

    /// Insert or replace `key`, evicting from its shard as needed.
    ///
    /// Returns whether the write landed within the configured ceilings.
    pub(crate) fn insert(&self, key: &str, value: Value, ttl: Duration, origin: Origin) -> bool {
        let size = estimate_size(key, &value);
        let index = self.router.route(key);
        let mut shard = self.shards[index].lock();

        if origin == Origin::Live {
            self.log_mutation(|| WalOperation::set(key, &value, ttl));
        }

        if let Some(previous) = shard.pop(key) {
            self.bounds.record_remove(previous.size());
        }

        let outcome = self.bounds.enforce(&mut shard, size);
        if outcome.evicted > 0 {
            self.metrics.record_evictions(outcome.evicted);
        }

        shard.put(key.to_string(), CacheEntry::new(value, ttl, size));
        self.bounds.record_insert(size);
        drop(shard);

        if origin == Origin::Live {
            self.metrics.record_set();
        }
        tracing::trace!(key, shard = index, size, evicted = outcome.evicted, "Stored entry");
        outcome.within_bounds
    }

    /// Value of a live entry, refreshing its recency. Expired entries are removed.
    pub(crate) fn lookup(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        let index = self.router.route(key);
        let mut shard = self.shards[index].lock();

        let expired = match shard.get(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                let value = entry.value().clone();
                self.metrics.record_hit();
                return Some(value);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            if let Some(entry) = shard.pop(key) {
                self.bounds.record_remove(entry.size());
                self.metrics.record_expirations(1);
                tracing::trace!(key, shard = index, "Lazily removed expired entry");
            }
        }
        drop(shard);

        self.metrics.record_miss();
        None
    }

    /// Remove `key`, returning whether a live entry was present
    pub(crate) fn remove(&self, key: &str, origin: Origin) -> bool {
        let now = Instant::now();
        let index = self.router.route(key);
        let mut shard = self.shards[index].lock();

        if !shard.contains(key) {
            return false;
        }

        if origin == Origin::Live {
            self.log_mutation(|| Ok(WalOperation::delete(key)));
        }

        let Some(entry) = shard.pop(key) else {
            return false;
        };
        drop(shard);

        self.bounds.record_remove(entry.size());
        let was_live = !entry.is_expired_at(now);
        if origin == Origin::Live && was_live {
            self.metrics.record_delete();
        }
        tracing::trace!(key, shard = index, was_live, "Removed entry");
        was_live
    }

    /// Empty every shard in turn, returning how many entries were dropped
    pub(crate) fn clear_shards(&self, origin: Origin) -> usize {
        if origin == Origin::Live {
            self.log_mutation(|| Ok(WalOperation::Clear));
        }

        let mut total = 0;
        for shard in &self.shards {
            let mut entries = shard.lock();
            let count = entries.len();
            let bytes: usize = entries.iter().map(|(_, entry)| entry.size()).sum();
            entries.clear();
            drop(entries);

            self.bounds.record_bulk_remove(count, bytes);
            total += count;
        }
        total
    }

    /// Sweep one shard for expired entries
    pub(crate) fn sweep_shard(&self, index: usize, now: Instant) -> SweepResult {
        let Some(shard) = self.shards.get(index) else {
            return SweepResult::default();
        };

        let result = shard.sweep_expired(now);
        if result.removed > 0 {
            self.bounds.record_bulk_remove(result.removed, result.bytes);
            self.metrics.record_expirations(result.removed);
            tracing::debug!(shard = index, removed = result.removed, "Swept expired entries");
        }
        result
    }

    /// Entries per shard, by index
    pub(crate) fn shard_distribution(&self) -> Vec<usize> {
        self.shards.iter().map(|shard| shard.len()).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.len()).sum()
    }
}
