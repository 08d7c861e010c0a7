//! Proactive expiry sweeps
//!
//! Lazy expiry on read never reclaims keys that are written once and never
//! read again. The [`CleanupScheduler`] walks the shards on a fixed interval,
//! holding one shard lock at a time.

mod background;

pub use background::CleanupScheduler;
