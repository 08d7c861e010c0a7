//! Prometheus text exposition for cache metrics

use super::detailed::DetailedMetrics;
use crate::errors::{CacheError, Result};
use prometheus::{
    Encoder, Gauge, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder,
};

fn metric_error(e: prometheus::Error) -> CacheError {
    CacheError::configuration(format!("Failed to initialize metrics: {e}"))
}

/// Mirrors a [`DetailedMetrics`] into a private Prometheus registry
pub struct PrometheusExporter {
    registry: Registry,
    operations: IntCounterVec,
    wal_records: IntCounterVec,
    validation_errors: IntCounter,
    entries: IntGauge,
    memory_bytes: IntGauge,
    shard_entries: IntGaugeVec,
    hit_rate: Gauge,
    wal_degraded: IntGauge,
}

impl PrometheusExporter {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let operations = IntCounterVec::new(
            Opts::new(
                "shardcache_operations_total",
                "Total number of cache operations by kind",
            ),
            &["operation"],
        )
        .map_err(metric_error)?;
        registry
            .register(Box::new(operations.clone()))
            .map_err(metric_error)?;

        let wal_records = IntCounterVec::new(
            Opts::new(
                "shardcache_wal_records_total",
                "Write-ahead log appends by result",
            ),
            &["result"],
        )
        .map_err(metric_error)?;
        registry
            .register(Box::new(wal_records.clone()))
            .map_err(metric_error)?;

        let validation_errors = IntCounter::new(
            "shardcache_validation_errors_total",
            "Operations rejected for invalid input",
        )
        .map_err(metric_error)?;
        registry
            .register(Box::new(validation_errors.clone()))
            .map_err(metric_error)?;

        let entries = IntGauge::new("shardcache_entries", "Entries across all shards")
            .map_err(metric_error)?;
        registry
            .register(Box::new(entries.clone()))
            .map_err(metric_error)?;

        let memory_bytes = IntGauge::new(
            "shardcache_memory_bytes",
            "Estimated memory footprint of stored entries",
        )
        .map_err(metric_error)?;
        registry
            .register(Box::new(memory_bytes.clone()))
            .map_err(metric_error)?;

        let shard_entries = IntGaugeVec::new(
            Opts::new("shardcache_shard_entries", "Entries held by each shard"),
            &["shard"],
        )
        .map_err(metric_error)?;
        registry
            .register(Box::new(shard_entries.clone()))
            .map_err(metric_error)?;

        let hit_rate = Gauge::new("shardcache_hit_rate", "Hits over lookups since start")
            .map_err(metric_error)?;
        registry
            .register(Box::new(hit_rate.clone()))
            .map_err(metric_error)?;

        let wal_degraded = IntGauge::new(
            "shardcache_wal_degraded",
            "1 when the last write-ahead log append failed",
        )
        .map_err(metric_error)?;
        registry
            .register(Box::new(wal_degraded.clone()))
            .map_err(metric_error)?;

        Ok(Self {
            registry,
            operations,
            wal_records,
            validation_errors,
            entries,
            memory_bytes,
            shard_entries,
            hit_rate,
            wal_degraded,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Bring every series up to date with `metrics`
    pub fn update(&self, metrics: &DetailedMetrics) {
        let counters = &metrics.counters;
        for (operation, value) in [
            ("hit", counters.hits),
            ("miss", counters.misses),
            ("set", counters.sets),
            ("delete", counters.deletes),
            ("eviction", counters.evictions),
            ("expiration", counters.expirations),
        ] {
            advance(&self.operations.with_label_values(&[operation]), value);
        }
        advance(
            &self.wal_records.with_label_values(&["appended"]),
            counters.wal_appends,
        );
        advance(
            &self.wal_records.with_label_values(&["failed"]),
            counters.wal_failures,
        );
        advance(&self.validation_errors, counters.validation_errors);

        self.entries.set(metrics.size as i64);
        self.memory_bytes.set(metrics.memory_bytes as i64);
        for (shard, count) in metrics.shard_distribution.iter().enumerate() {
            self.shard_entries
                .with_label_values(&[&shard.to_string()])
                .set(*count as i64);
        }
        self.hit_rate.set(counters.hit_rate);
        self.wal_degraded.set(i64::from(metrics.wal.degraded));
    }

    /// Update from `metrics` and encode the registry in text format
    pub fn render(&self, metrics: &DetailedMetrics) -> Result<String> {
        self.update(metrics);

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| CacheError::Serialization {
                context: "Prometheus exposition".to_string(),
                source: Box::new(e),
            })?;
        String::from_utf8(buffer).map_err(|e| CacheError::Serialization {
            context: "Prometheus exposition".to_string(),
            source: Box::new(e),
        })
    }
}

impl std::fmt::Debug for PrometheusExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusExporter").finish_non_exhaustive()
    }
}

/// Counters only move forward; catch up to the observed absolute value
fn advance(counter: &IntCounter, value: u64) {
    let current = counter.get();
    if value > current {
        counter.inc_by(value - current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EffectiveLimits;
    use crate::metrics::MetricsSnapshot;
    use crate::storage::WalStats;

    fn sample() -> DetailedMetrics {
        DetailedMetrics {
            counters: MetricsSnapshot {
                hits: 7,
                misses: 3,
                sets: 10,
                evictions: 2,
                hit_rate: 0.7,
                ..MetricsSnapshot::default()
            },
            size: 8,
            memory_bytes: 4096,
            shard_count: 2,
            shard_distribution: vec![5, 3],
            limits: EffectiveLimits {
                max_entries: 100,
                max_memory_bytes: 1 << 20,
            },
            utilization: 0.08,
            paranoia_mode: false,
            eviction_policy: "lru",
            wal: WalStats::default(),
            uptime_secs: 2.0,
        }
    }

    #[test]
    fn test_render_exposes_counters_and_gauges() -> Result<()> {
        let exporter = PrometheusExporter::new()?;
        let text = exporter.render(&sample())?;

        assert!(text.contains("shardcache_operations_total{operation=\"hit\"} 7"));
        assert!(text.contains("shardcache_operations_total{operation=\"eviction\"} 2"));
        assert!(text.contains("shardcache_entries 8"));
        assert!(text.contains("shardcache_shard_entries{shard=\"1\"} 3"));
        assert!(text.contains("shardcache_hit_rate 0.7"));
        Ok(())
    }

    #[test]
    fn test_counters_never_move_backwards() -> Result<()> {
        let exporter = PrometheusExporter::new()?;
        exporter.update(&sample());

        let mut older = sample();
        older.counters.hits = 2;
        exporter.update(&older);

        let hits = exporter.operations.with_label_values(&["hit"]).get();
        assert_eq!(hits, 7);
        Ok(())
    }
}
