//! Cache metrics collection and tracking
//!
//! [`CacheMetrics`] holds the live atomic counters. [`DetailedMetrics`] is the
//! serializable view returned by `get_detailed_metrics`, and
//! [`PrometheusExporter`] renders it for scraping.

mod core;
mod detailed;
mod exporter;
mod snapshot;

pub use self::core::CacheMetrics;
pub use detailed::DetailedMetrics;
pub use exporter::PrometheusExporter;
pub use snapshot::MetricsSnapshot;
