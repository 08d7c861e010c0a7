//! Cache remove operations

use crate::errors::Result;
use crate::validation::{parse_key, validate_key};
use serde_json::Value;

use crate::core::types::{Origin, ShardedCache};

impl ShardedCache {
    /// Remove `key`, returning whether a live entry was present. Missing keys are not an error.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let key = validate_key(key).map_err(|e| self.reject(e))?;
        Ok(self.inner.remove(key, Origin::Live))
    }

    /// [`delete`](Self::delete) for an untyped key
    pub fn delete_json(&self, key: &Value) -> Result<bool> {
        let key = parse_key(key).map_err(|e| self.reject(e))?;
        Ok(self.inner.remove(key, Origin::Live))
    }
}
