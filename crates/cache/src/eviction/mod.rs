//! Eviction policies and resource bounds
//!
//! Eviction is per shard: a write that pushes the cache over a ceiling evicts
//! from the shard receiving the write only, so no write ever needs more than
//! one shard lock.

mod bounds;
mod factory;
mod policies;
mod traits;

// Re-export public API
pub use bounds::{BoundsEnforcer, EnforcementOutcome, EVICTION_BATCH_SIZE};
pub use factory::create_eviction_policy;
pub use policies::LruPolicy;
pub use traits::EvictionPolicy;

#[cfg(test)]
mod tests;
