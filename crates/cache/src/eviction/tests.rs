//! Tests for eviction policies and bounds

use super::*;
use crate::config::EffectiveLimits;
use crate::entry::CacheEntry;
use crate::shard::Shard;
use serde_json::json;
use std::time::Duration;

fn enforcer(max_entries: usize, max_memory_bytes: u64) -> BoundsEnforcer {
    BoundsEnforcer::new(
        EffectiveLimits {
            max_entries,
            max_memory_bytes,
        },
        Box::new(LruPolicy::new()),
    )
}

fn insert(shard: &Shard, bounds: &BoundsEnforcer, key: &str, size: usize) -> EnforcementOutcome {
    let mut entries = shard.lock();
    let outcome = bounds.enforce(&mut entries, size);
    entries.put(
        key.to_string(),
        CacheEntry::new(json!(key), Duration::from_secs(60), size),
    );
    bounds.record_insert(size);
    outcome
}

#[test]
fn test_lru_eviction() {
    let shard = Shard::new();
    let bounds = enforcer(3, u64::MAX);

    insert(&shard, &bounds, "a", 1);
    insert(&shard, &bounds, "b", 1);
    insert(&shard, &bounds, "c", 1);

    // Touch 'a' so 'b' becomes least recently used
    shard.lock().get("a");

    let outcome = insert(&shard, &bounds, "d", 1);
    assert_eq!(
        outcome,
        EnforcementOutcome {
            within_bounds: true,
            evicted: 1
        }
    );
    assert!(shard.lock().peek("b").is_none());
    assert_eq!(bounds.entry_count(), 3);
}

#[test]
fn test_memory_ceiling_evicts_until_fit() {
    let shard = Shard::new();
    let bounds = enforcer(100, 300);

    insert(&shard, &bounds, "a", 100);
    insert(&shard, &bounds, "b", 100);
    insert(&shard, &bounds, "c", 100);

    let outcome = insert(&shard, &bounds, "d", 250);
    assert_eq!(outcome.evicted, 3);
    assert!(outcome.within_bounds);
    assert_eq!(bounds.memory_bytes(), 250);
}

#[test]
fn test_empty_shard_reports_out_of_bounds() {
    let busy = Shard::new();
    let idle = Shard::new();
    let bounds = enforcer(1, u64::MAX);

    insert(&busy, &bounds, "a", 1);

    // The receiving shard has nothing to evict; the write proceeds anyway
    let outcome = insert(&idle, &bounds, "b", 1);
    assert!(!outcome.within_bounds);
    assert_eq!(outcome.evicted, 0);
    assert_eq!(bounds.entry_count(), 2);
}

#[test]
fn test_eviction_batch_is_bounded() {
    let shard = Shard::new();
    let bounds = enforcer(1000, 1000);
    for i in 0..20 {
        insert(&shard, &bounds, &format!("k{i}"), 50);
    }

    // Needs all 20 entries gone, but one write may only evict a batch
    let outcome = insert(&shard, &bounds, "huge", 1000);
    assert_eq!(outcome.evicted, EVICTION_BATCH_SIZE);
    assert!(!outcome.within_bounds);
}

#[test]
fn test_counters_saturate() {
    let bounds = enforcer(10, 10);
    bounds.record_remove(5);
    bounds.record_bulk_remove(3, 100);
    assert_eq!(bounds.entry_count(), 0);
    assert_eq!(bounds.memory_bytes(), 0);
}

#[test]
fn test_factory() {
    assert_eq!(create_eviction_policy("LRU").map(|p| p.name()).ok(), Some("lru"));
    assert!(create_eviction_policy("random").is_err());
}
