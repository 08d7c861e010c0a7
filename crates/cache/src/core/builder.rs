//! Cache builder and initialization

use crate::cleanup::CleanupScheduler;
use crate::config::CacheConfig;
use crate::errors::Result;
use crate::eviction::{create_eviction_policy, BoundsEnforcer};
use crate::metrics::CacheMetrics;
use crate::shard::{Shard, ShardRouter};
use crate::storage::{ReplayStats, WalOperation, WalRecord, WriteAheadLog};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use super::types::{CacheInner, Origin, ShardedCache};

impl ShardedCache {
    /// Build a cache from `config`.
    ///
    /// Opens (and optionally replays) the write-ahead log, then starts the
    /// background cleanup task if a tokio runtime is available and the
    /// cleanup interval is non-zero. A log that cannot be opened or replayed
    /// does not fail construction: the cache serves from memory and reports
    /// the WAL as degraded.
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;

        let policy = create_eviction_policy(&config.eviction_policy)?;
        let bounds = BoundsEnforcer::new(config.effective_limits(), policy);
        let router = ShardRouter::new(config.shard_count);
        let shards = (0..router.shard_count()).map(|_| Shard::new()).collect();

        let wal_fault = OnceCell::new();
        let wal = match config.wal.as_ref() {
            Some(wal_config) => match WriteAheadLog::open(wal_config) {
                Ok(wal) => Some(wal),
                Err(e) => {
                    tracing::warn!(
                        path = %wal_config.path.display(),
                        error = %e,
                        "Cannot open write-ahead log; serving from memory without durability"
                    );
                    let _ = wal_fault.set(format!("open failed: {e}"));
                    None
                }
            },
            None => None,
        };
        let replay_on_open = config.wal.as_ref().is_some_and(|w| w.replay_on_open);

        let inner = Arc::new(CacheInner {
            config,
            router,
            shards,
            bounds,
            metrics: CacheMetrics::new(),
            wal,
            wal_fault,
            cleanup: Mutex::new(None),
        });

        if replay_on_open {
            if let Some(wal) = inner.wal.as_ref() {
                match replay_into(&inner, wal) {
                    Ok(stats) => tracing::info!(
                        path = %wal.path().display(),
                        applied = stats.applied,
                        rejected = stats.rejected,
                        truncated_tail = stats.truncated_tail,
                        entries = inner.bounds.entry_count(),
                        "Replayed write-ahead log"
                    ),
                    Err(e) => {
                        // No appends on top of a partial replay
                        tracing::warn!(
                            path = %wal.path().display(),
                            error = %e,
                            entries = inner.bounds.entry_count(),
                            "Write-ahead log replay failed; continuing without durability"
                        );
                        let _ = inner.wal_fault.set(format!("replay failed: {e}"));
                        if let Err(e) = wal.close() {
                            tracing::warn!(error = %e, "Failed to close WAL after replay failure");
                        }
                    }
                }
            }
        }

        let scheduler =
            CleanupScheduler::start(Arc::downgrade(&inner), inner.config.cleanup_interval);
        *inner.cleanup.lock() = scheduler;

        tracing::debug!(
            shards = inner.shards.len(),
            max_entries = inner.bounds.limits().max_entries,
            max_memory_bytes = inner.bounds.limits().max_memory_bytes,
            paranoia = inner.config.paranoia_mode,
            wal = inner.active_wal().is_some(),
            "Created sharded cache"
        );

        Ok(Self { inner })
    }
}

/// Rebuild shard contents from the log without re-appending.
///
/// SET records get whatever TTL they had left when the record was written;
/// ones that have since expired are treated as removals of the key.
fn replay_into(inner: &CacheInner, wal: &WriteAheadLog) -> Result<ReplayStats> {
    let now = SystemTime::now();
    wal.replay(|record| apply_record(inner, record, now))
}

fn apply_record(inner: &CacheInner, record: &WalRecord, now: SystemTime) {
    match &record.operation {
        WalOperation::Set { key, ttl, .. } => {
            let elapsed = now
                .duration_since(record.timestamp)
                .unwrap_or(Duration::ZERO);
            let remaining = ttl.saturating_sub(elapsed);
            if remaining.is_zero() {
                inner.remove(key, Origin::Replay);
                return;
            }

            match record.operation.value() {
                Ok(Some(value)) => {
                    inner.insert(key, value, remaining, Origin::Replay);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        sequence = record.sequence,
                        key = %key,
                        error = %e,
                        "Skipping WAL record with unreadable value"
                    );
                }
            }
        }
        WalOperation::Delete { key } => {
            inner.remove(key, Origin::Replay);
        }
        WalOperation::Clear => {
            inner.clear_shards(Origin::Replay);
        }
    }
}
