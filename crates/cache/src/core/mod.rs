//! Sharded cache facade
//!
//! [`ShardedCache`] validates input, routes each key to its shard and applies
//! the mutation under that shard's lock alone. Durability, bounds and metrics
//! are handled inline; whole-cache work (clear, snapshot, restore, cleanup)
//! visits one shard at a time.

mod builder;
mod internal;
mod operations;
mod types;

pub use types::ShardedCache;
pub(crate) use types::{CacheInner, Origin};
