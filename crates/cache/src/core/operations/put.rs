//! Cache put operations

use crate::errors::Result;
use crate::validation::{parse_key, parse_ttl, validate_key, validate_ttl, validate_value};
use serde_json::Value;
use std::time::Duration;

use crate::core::types::{Origin, ShardedCache};

impl ShardedCache {
    /// Store `value` under `key` for `ttl`, or the configured default TTL when `None`.
    ///
    /// Replaces any existing entry and marks the key most recently used. The
    /// returned flag reports whether the write stayed within the configured
    /// ceilings after shard-local eviction; it is informational only. A failed
    /// WAL append does not fail the write.
    pub fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<bool> {
        let key = validate_key(key).map_err(|e| self.reject(e))?;
        validate_value(&value).map_err(|e| self.reject(e))?;
        let ttl = match ttl {
            Some(ttl) => validate_ttl(ttl).map_err(|e| self.reject(e))?,
            None => self.inner.config.default_ttl,
        };

        Ok(self.inner.insert(key, value, ttl, Origin::Live))
    }

    /// [`set`](Self::set) for callers forwarding untyped payloads.
    ///
    /// `ttl` is a number of seconds (fractional allowed) or `null` for the default.
    pub fn set_json(&self, key: &Value, value: Value, ttl: &Value) -> Result<bool> {
        let key = parse_key(key).map_err(|e| self.reject(e))?;
        validate_value(&value).map_err(|e| self.reject(e))?;
        let ttl = parse_ttl(ttl)
            .map_err(|e| self.reject(e))?
            .unwrap_or(self.inner.config.default_ttl);

        Ok(self.inner.insert(key, value, ttl, Origin::Live))
    }
}
