//! Deterministic key → shard routing

use xxhash_rust::xxh3::xxh3_64;

/// Maps keys to shard indices.
///
/// Uses xxh3 rather than the std `RandomState` hasher so a key lands in the
/// same shard across process restarts for a given shard count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardRouter {
    shard_count: usize,
}

impl ShardRouter {
    /// Create a router; a zero shard count is treated as one shard
    pub fn new(shard_count: usize) -> Self {
        Self {
            shard_count: shard_count.max(1),
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shard_count
    }

    #[inline]
    pub fn route(&self, key: &str) -> usize {
        (xxh3_64(key.as_bytes()) % self.shard_count as u64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_route_is_stable() {
        let router = ShardRouter::new(16);
        for key in ["a", "user:1", "LLM:prompt:abc", "日本"] {
            assert_eq!(router.route(key), router.route(key));
            assert_eq!(router.route(key), ShardRouter::new(16).route(key));
        }
    }

    #[test]
    fn test_near_collisions_route_in_range() {
        let router = ShardRouter::new(8);
        for key in ["Key", "key", "KEY", "kEy"] {
            assert!(router.route(key) < 8);
        }
    }

    #[test]
    fn test_distribution_touches_every_shard() {
        let router = ShardRouter::new(16);
        let mut counts = [0usize; 16];
        for i in 0..4096 {
            counts[router.route(&format!("key-{i}"))] += 1;
        }
        // Every shard gets a reasonable share of 256 expected keys
        for count in counts {
            assert!(count > 128, "uneven distribution: {counts:?}");
        }
    }

    #[test]
    fn test_single_shard() {
        let router = ShardRouter::new(0);
        assert_eq!(router.shard_count(), 1);
        assert_eq!(router.route("anything"), 0);
    }

    proptest! {
        #[test]
        fn prop_route_within_bounds(key in "\\PC{1,64}", shards in 1usize..128) {
            let router = ShardRouter::new(shards);
            let idx = router.route(&key);
            prop_assert!(idx < shards);
            prop_assert_eq!(idx, router.route(&key));
        }
    }
}
