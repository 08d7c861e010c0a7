//! Snapshot creation and restore on the cache

use super::{Snapshot, SnapshotEntry, SnapshotMetadata, SNAPSHOT_FORMAT_VERSION};
use crate::core::{Origin, ShardedCache};
use crate::errors::{CacheError, Result};
use crate::validation::{validate_key, validate_ttl, validate_value};
use chrono::Utc;
use serde_json::Value;
use std::time::{Duration, Instant};

impl ShardedCache {
    /// Copy every non-expired entry, one shard lock at a time.
    ///
    /// The copy is detached from the cache. It is not an instant-in-time cut
    /// when writers are active on shards that have not been read yet.
    pub fn create_backup_snapshot(&self) -> Snapshot {
        let mut shards = Vec::with_capacity(self.inner.shards.len());

        for shard in &self.inner.shards {
            let entries = shard.lock();
            let now = Instant::now();
            let copied: Vec<SnapshotEntry> = entries
                .iter()
                .rev()
                .filter_map(|(key, entry)| {
                    let remaining = entry.remaining_ttl(now);
                    let ttl_remaining_ms = u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX);
                    (ttl_remaining_ms > 0).then(|| SnapshotEntry {
                        key: key.clone(),
                        value: entry.value().clone(),
                        ttl_remaining_ms,
                    })
                })
                .collect();
            drop(entries);
            shards.push(copied);
        }

        let total_entries = shards.iter().map(Vec::len).sum::<usize>() as u64;
        tracing::info!(total_entries, shards = shards.len(), "Created cache snapshot");

        Snapshot {
            metadata: SnapshotMetadata {
                total_entries,
                created_at: Utc::now(),
                format_version: SNAPSHOT_FORMAT_VERSION,
                shard_count: shards.len(),
            },
            shards,
        }
    }

    /// Repopulate the cache from `snapshot`, returning how many entries were restored.
    ///
    /// The whole snapshot is checked before anything is written: a version
    /// mismatch, a `total_entries` that disagrees with the entries present or
    /// an invalid key, value or TTL rejects it untouched. Existing entries
    /// under other keys are kept; callers wanting an exact copy `clear()`
    /// first. Restored entries go through the WAL like any other write.
    pub fn restore_from_snapshot(&self, snapshot: &Snapshot) -> Result<usize> {
        let metadata = &snapshot.metadata;
        if metadata.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(CacheError::VersionMismatch {
                expected: SNAPSHOT_FORMAT_VERSION,
                actual: metadata.format_version,
            });
        }

        let found = snapshot.len() as u64;
        if metadata.total_entries != found {
            return Err(CacheError::snapshot_format(format!(
                "metadata.total_entries is {} but the snapshot holds {found} entries",
                metadata.total_entries
            )));
        }

        let mut pending: Vec<(&str, Duration)> = Vec::with_capacity(snapshot.len());
        for entry in snapshot.entries() {
            let key = validate_key(&entry.key)?;
            validate_value(&entry.value)?;
            let ttl = validate_ttl(Duration::from_millis(entry.ttl_remaining_ms))?;
            pending.push((key, ttl));
        }

        let mut restored = 0;
        for (entry, (key, ttl)) in snapshot.entries().zip(pending) {
            if ttl.is_zero() {
                continue;
            }
            self.inner.insert(key, entry.value.clone(), ttl, Origin::Live);
            restored += 1;
        }

        tracing::info!(
            restored,
            source_shards = metadata.shard_count,
            created_at = %metadata.created_at,
            "Restored cache snapshot"
        );
        Ok(restored)
    }

    /// Validate an untyped snapshot document and restore it
    pub fn restore_from_snapshot_json(&self, snapshot: &Value) -> Result<usize> {
        let snapshot = Snapshot::from_json(snapshot)?;
        self.restore_from_snapshot(&snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfigBuilder;
    use serde_json::json;

    fn cache(shards: usize) -> Result<ShardedCache> {
        ShardedCache::new(
            CacheConfigBuilder::new()
                .with_shard_count(shards)
                .with_cleanup_interval(Duration::ZERO)
                .build(),
        )
    }

    #[test]
    fn test_snapshot_round_trip() -> Result<()> {
        let cache = cache(4)?;
        for i in 0..50 {
            cache.set(&format!("key-{i}"), json!({"i": i}), None)?;
        }

        let snapshot = cache.create_backup_snapshot();
        assert_eq!(snapshot.metadata.total_entries, 50);
        assert_eq!(snapshot.metadata.shard_count, 4);

        assert_eq!(cache.clear(), 50);
        assert_eq!(cache.size(), 0);

        assert_eq!(cache.restore_from_snapshot(&snapshot)?, 50);
        assert_eq!(cache.size(), 50);
        for i in 0..50 {
            assert_eq!(cache.get(&format!("key-{i}"))?, Some(json!({"i": i})));
        }
        Ok(())
    }

    #[test]
    fn test_snapshot_is_detached() -> Result<()> {
        let cache = cache(2)?;
        cache.set("k", json!("before"), None)?;
        let snapshot = cache.create_backup_snapshot();

        cache.set("k", json!("after"), None)?;
        cache.set("new", json!(1), None)?;

        assert_eq!(snapshot.len(), 1);
        let entry = snapshot.entries().next().map(|e| e.value.clone());
        assert_eq!(entry, Some(json!("before")));
        Ok(())
    }

    #[test]
    fn test_snapshot_skips_expired_entries() -> Result<()> {
        let cache = cache(2)?;
        cache.set("short", json!(1), Some(Duration::from_millis(10)))?;
        cache.set("long", json!(2), None)?;
        std::thread::sleep(Duration::from_millis(30));

        let snapshot = cache.create_backup_snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.metadata.total_entries, 1);
        Ok(())
    }

    #[test]
    fn test_restore_into_different_shard_count() -> Result<()> {
        let source = cache(8)?;
        for i in 0..30 {
            source.set(&format!("k{i}"), json!(i), None)?;
        }
        let snapshot = source.create_backup_snapshot();

        let target = cache(3)?;
        assert_eq!(target.restore_from_snapshot(&snapshot)?, 30);
        for i in 0..30 {
            assert_eq!(target.get(&format!("k{i}"))?, Some(json!(i)));
        }
        Ok(())
    }

    #[test]
    fn test_restore_preserves_remaining_ttl() -> Result<()> {
        let source = cache(1)?;
        source.set("k", json!(1), Some(Duration::from_secs(10)))?;
        let snapshot = source.create_backup_snapshot();
        let ttl = snapshot.entries().next().map(|e| e.ttl_remaining_ms);
        assert!(matches!(ttl, Some(ms) if ms > 9_000 && ms <= 10_000));
        Ok(())
    }

    #[test]
    fn test_version_mismatch_is_rejected() -> Result<()> {
        let cache = cache(2)?;
        cache.set("k", json!(1), None)?;
        let mut snapshot = cache.create_backup_snapshot();
        snapshot.metadata.format_version = 99;

        cache.clear();
        let result = cache.restore_from_snapshot(&snapshot);
        assert!(matches!(
            result,
            Err(CacheError::VersionMismatch {
                expected: 1,
                actual: 99
            })
        ));
        assert_eq!(cache.size(), 0);
        Ok(())
    }

    #[test]
    fn test_count_mismatch_is_rejected() -> Result<()> {
        let cache = cache(2)?;
        cache.set("k", json!(1), None)?;
        let mut snapshot = cache.create_backup_snapshot();
        snapshot.metadata.total_entries = 5;

        let result = cache.restore_from_snapshot(&snapshot);
        assert!(matches!(result, Err(CacheError::SnapshotFormat { .. })));
        Ok(())
    }

    #[test]
    fn test_invalid_entry_rejects_whole_snapshot() -> Result<()> {
        let cache = cache(2)?;
        let doc = json!({
            "metadata": {
                "total_entries": 2,
                "created_at": "2024-05-01T12:00:00Z",
                "format_version": 1
            },
            "shards": [[
                {"key": "fine", "value": 1, "ttl_remaining_ms": 1000},
                {"key": "bad\nkey", "value": 2, "ttl_remaining_ms": 1000}
            ]]
        });

        let result = cache.restore_from_snapshot_json(&doc);
        assert_eq!(
            result.err().and_then(|e| e.validation_kind()),
            Some("InvalidKeyChars")
        );
        assert_eq!(cache.size(), 0);
        Ok(())
    }

    #[test]
    fn test_restore_from_json_round_trip() -> Result<()> {
        let cache = cache(4)?;
        cache.set("a", json!("x"), None)?;
        cache.set("b", json!([1, 2, 3]), None)?;
        let doc = cache.create_backup_snapshot().to_json()?;

        cache.clear();
        assert_eq!(cache.restore_from_snapshot_json(&doc)?, 2);
        assert_eq!(cache.get("b")?, Some(json!([1, 2, 3])));

        assert!(cache.restore_from_snapshot_json(&json!([])).is_err());
        Ok(())
    }
}
