//! Self-test for external monitoring
//!
//! `health_check()` performs a live write, read and delete of a sentinel key
//! and reports a structured status. It never fails: internal faults,
//! including panics, are reported as [`HealthStatus::Critical`].

mod checks;

pub use checks::{DEGRADED_UTILIZATION, HEALTH_SENTINEL_KEY};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Overall health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// Serving, but durability is lost or a ceiling is nearly reached
    Degraded,
    /// The self-test failed
    Critical,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub size: usize,
    pub shard_count: usize,
    pub hit_rate: f64,
    /// Fraction of the tighter ceiling in use
    pub utilization: f64,
    /// Duration of the self-test
    pub latency_ms: f64,
    pub wal_degraded: bool,
    /// Reasons for a degraded status
    pub warnings: Vec<String>,
    /// Failure captured from a critical self-test
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}
