//! Factory for creating eviction policies

use crate::errors::{CacheError, Result};

use super::policies::LruPolicy;
use super::traits::EvictionPolicy;

/// Eviction policy factory
pub fn create_eviction_policy(policy_type: &str) -> Result<Box<dyn EvictionPolicy>> {
    match policy_type.to_lowercase().as_str() {
        "lru" => Ok(Box::new(LruPolicy::new())),
        _ => Err(CacheError::configuration(format!(
            "Unknown eviction policy: {policy_type}"
        ))),
    }
}
