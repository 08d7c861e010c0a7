//! Sharded, TTL-bounded, durable in-process cache
//!
//! This crate provides the cache engine with features like:
//! - Per-shard locking with stable key routing
//! - Entry-count and memory ceilings with shard-local LRU eviction
//! - Lazy and scheduled expiry
//! - Write-ahead logging with crash replay
//! - Snapshots, compensating rollback, metrics and a health probe
//!
//! ```no_run
//! use serde_json::json;
//! use shardcache::{CacheConfigBuilder, ShardedCache};
//! use std::time::Duration;
//!
//! # fn main() -> shardcache::Result<()> {
//! let cache = ShardedCache::new(CacheConfigBuilder::new().with_shard_count(8).build())?;
//! cache.set("answer", json!(42), Some(Duration::from_secs(60)))?;
//! assert_eq!(cache.get("answer")?, Some(json!(42)));
//! # Ok(())
//! # }
//! ```

pub mod cleanup;
pub mod config;
pub mod core;
pub mod entry;
pub mod errors;
pub mod eviction;
pub mod global;
pub mod health;
pub mod logging;
pub mod metrics;
pub mod shard;
pub mod snapshot;
pub mod storage;
pub mod transaction;
pub mod validation;

// Re-export main types
pub use config::{CacheConfig, CacheConfigBuilder, CacheConfigLoader, WalConfig};
pub use self::core::ShardedCache;
pub use errors::{CacheError, Error, RecoveryHint, Result, ValidationError};
pub use health::{HealthReport, HealthStatus};
pub use metrics::{DetailedMetrics, PrometheusExporter};
pub use snapshot::{Snapshot, SnapshotEntry, SnapshotMetadata, SNAPSHOT_FORMAT_VERSION};
pub use transaction::{RollbackKind, RollbackOperation};
