//! Metrics snapshot functionality
//!
//! This module provides snapshot capabilities for capturing
//! a point-in-time view of all counters.

use super::core::CacheMetrics;
use serde::Serialize;
use std::sync::atomic::Ordering;

/// A snapshot of cache counters at a point in time
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub wal_appends: u64,
    pub wal_failures: u64,
    pub validation_errors: u64,
    pub hit_rate: f64,
}

impl CacheMetrics {
    /// Take a snapshot of current counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            wal_appends: self.wal_appends.load(Ordering::Relaxed),
            wal_failures: self.wal_failures.load(Ordering::Relaxed),
            validation_errors: self.validation_errors.load(Ordering::Relaxed),
            hit_rate: self.hit_rate(),
        }
    }
}
