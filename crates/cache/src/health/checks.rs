//! Health check implementation

use super::{HealthReport, HealthStatus};
use crate::core::ShardedCache;
use crate::entry::CacheEntry;
use chrono::Utc;
use serde_json::json;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Key used by the self-test round trip
pub const HEALTH_SENTINEL_KEY: &str = "__shardcache_health__";

/// Utilization at which the cache reports itself degraded
pub const DEGRADED_UTILIZATION: f64 = 0.9;

const SENTINEL_TTL: Duration = Duration::from_secs(60);

impl ShardedCache {
    /// Run the sentinel round trip and report status. Never fails.
    pub fn health_check(&self) -> HealthReport {
        self.check_with(|| self.sentinel_round_trip())
    }

    fn check_with<F>(&self, probe: F) -> HealthReport
    where
        F: FnOnce() -> Result<(), String>,
    {
        let started = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| probe().map(|()| self.observe())));
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        match outcome {
            Ok(Ok(mut report)) => {
                report.latency_ms = latency_ms;
                if report.status == HealthStatus::Degraded {
                    tracing::warn!(warnings = ?report.warnings, "Cache health degraded");
                }
                report
            }
            Ok(Err(reason)) => self.critical(reason, latency_ms),
            Err(payload) => self.critical(
                format!("health probe panicked: {}", panic_message(payload.as_ref())),
                latency_ms,
            ),
        }
    }

    /// Write, read back and remove the sentinel directly on its shard.
    ///
    /// Bypasses the WAL, metrics and bounds so probing never evicts or logs.
    /// An entry a caller stored under the sentinel key is put back afterwards.
    fn sentinel_round_trip(&self) -> Result<(), String> {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let expected = json!({ "probe": nonce.to_string() });
        let shard = &self.inner.shards[self.inner.router.route(HEALTH_SENTINEL_KEY)];

        // One guard for the whole round trip: no writer can evict or replace the sentinel
        let mut entries = shard.lock();
        let displaced = entries.put(
            HEALTH_SENTINEL_KEY.to_string(),
            CacheEntry::new(expected.clone(), SENTINEL_TTL, 0),
        );
        let read = entries.pop(HEALTH_SENTINEL_KEY);
        if let Some(previous) = displaced {
            entries.put(HEALTH_SENTINEL_KEY.to_string(), previous);
        }
        drop(entries);

        match read {
            Some(entry) if entry.value() == &expected => Ok(()),
            Some(_) => Err("sentinel read back a different value".to_string()),
            None => Err("sentinel entry missing after write".to_string()),
        }
    }

    fn observe(&self) -> HealthReport {
        let inner = &self.inner;
        let utilization = inner.bounds.utilization();
        let wal_degraded = inner.wal_degraded();

        let mut warnings = Vec::new();
        if let Some(reason) = inner.wal_fault.get() {
            warnings.push(format!("write-ahead log unavailable: {reason}"));
        } else if wal_degraded {
            warnings.push("write-ahead log appends are failing".to_string());
        }
        if utilization >= DEGRADED_UTILIZATION {
            warnings.push(format!("cache at {:.0}% of capacity", utilization * 100.0));
        }
        let status = if warnings.is_empty() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };

        HealthReport {
            status,
            size: inner.len(),
            shard_count: inner.shards.len(),
            hit_rate: inner.metrics.hit_rate(),
            utilization,
            latency_ms: 0.0,
            wal_degraded,
            warnings,
            error: None,
            checked_at: Utc::now(),
        }
    }

    /// Report built only from atomics, safe to assemble after a fault
    fn critical(&self, error: String, latency_ms: f64) -> HealthReport {
        tracing::error!(error = %error, "Cache health check failed");
        HealthReport {
            status: HealthStatus::Critical,
            size: self.inner.bounds.entry_count(),
            shard_count: self.inner.shards.len(),
            hit_rate: self.inner.metrics.hit_rate(),
            utilization: self.inner.bounds.utilization(),
            latency_ms,
            wal_degraded: self.inner.wal_degraded(),
            warnings: Vec::new(),
            error: Some(error),
            checked_at: Utc::now(),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
