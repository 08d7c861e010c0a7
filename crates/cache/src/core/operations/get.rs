//! Cache get operations

use crate::errors::Result;
use crate::validation::{parse_key, validate_key};
use serde_json::Value;

use crate::core::types::ShardedCache;

impl ShardedCache {
    /// Value stored under `key`, or `None` on a miss or an expired entry.
    ///
    /// Expired entries found here are removed on the spot.
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        let key = validate_key(key).map_err(|e| self.reject(e))?;
        Ok(self.inner.lookup(key))
    }

    /// [`get`](Self::get) for an untyped key
    pub fn get_json(&self, key: &Value) -> Result<Option<Value>> {
        let key = parse_key(key).map_err(|e| self.reject(e))?;
        Ok(self.inner.lookup(key))
    }

    /// Whether a live entry exists, without counting a hit or miss or refreshing recency
    pub fn contains(&self, key: &str) -> Result<bool> {
        let key = validate_key(key).map_err(|e| self.reject(e))?;
        let now = std::time::Instant::now();
        let shard = self.inner.shards[self.inner.router.route(key)].lock();
        Ok(shard
            .peek(key)
            .is_some_and(|entry| !entry.is_expired_at(now)))
    }
}
