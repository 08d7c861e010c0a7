//! Optional process-wide cache instance
//!
//! Prefer constructing a [`ShardedCache`] and passing it (or an `Arc` of it)
//! to whatever needs it. For code that cannot be threaded through, this
//! module offers one lazily built shared instance behind explicit accessors.

use crate::config::CacheConfig;
use crate::errors::{CacheError, Result};
use crate::ShardedCache;
use once_cell::sync::OnceCell;
use std::sync::Arc;

static SHARED_CACHE: OnceCell<Arc<ShardedCache>> = OnceCell::new();

/// Shared instance, built from `config` by the first caller.
///
/// Concurrent first callers race safely: exactly one builds the cache and
/// the rest wait for it. Later calls ignore `config`. A failed build leaves
/// the slot empty so a later call can retry.
pub fn shared_cache<F>(config: F) -> Result<Arc<ShardedCache>>
where
    F: FnOnce() -> Result<CacheConfig>,
{
    SHARED_CACHE
        .get_or_try_init(|| {
            let cache = ShardedCache::new(config()?)?;
            tracing::debug!("Initialized shared cache instance");
            Ok(Arc::new(cache))
        })
        .cloned()
}

/// Install an already built cache as the shared instance
pub fn init_shared_cache(cache: ShardedCache) -> Result<Arc<ShardedCache>> {
    let cache = Arc::new(cache);
    SHARED_CACHE
        .set(Arc::clone(&cache))
        .map_err(|_| CacheError::configuration("shared cache already initialized"))?;
    Ok(cache)
}

/// Shared instance if one has been built
pub fn try_shared_cache() -> Option<Arc<ShardedCache>> {
    SHARED_CACHE.get().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfigBuilder;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_shared_instance_is_built_once() -> Result<()> {
        assert!(try_shared_cache().is_none());

        let failed = shared_cache(|| Err(CacheError::configuration("not yet")));
        assert!(failed.is_err());
        assert!(try_shared_cache().is_none());

        let first = shared_cache(|| {
            Ok(CacheConfigBuilder::new()
                .with_shard_count(2)
                .with_cleanup_interval(Duration::ZERO)
                .build())
        })?;
        first.set("shared", json!(true), None)?;

        let second = shared_cache(|| Ok(CacheConfigBuilder::new().with_shard_count(64).build()))?;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.shard_count(), 2);
        assert_eq!(second.get("shared")?, Some(json!(true)));

        assert!(try_shared_cache().is_some());
        assert!(init_shared_cache(ShardedCache::new(CacheConfig::default())?).is_err());
        Ok(())
    }
}
