//! Background cleanup task management

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::core::CacheInner;

/// Handle to the recurring expiry sweep.
///
/// The task only holds a weak reference to the cache, so it never keeps a
/// dropped cache alive. Dropping the handle aborts the task; [`stop`](Self::stop)
/// lets the current sweep finish first.
pub struct CleanupScheduler {
    running: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    handle: Option<JoinHandle<()>>,
    interval: Duration,
}

impl CleanupScheduler {
    /// Spawn the sweep on the current tokio runtime.
    ///
    /// Returns `None` when `interval` is zero (useful for tests) or when no
    /// runtime is available to run it.
    pub(crate) fn start(cache: Weak<CacheInner>, interval: Duration) -> Option<Self> {
        if interval.is_zero() {
            return None;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::debug!("No tokio runtime; background cleanup disabled");
                return None;
            }
        };

        let running = Arc::new(AtomicBool::new(true));
        let shutdown = Arc::new(Notify::new());
        let handle = runtime.spawn(run(
            cache,
            interval,
            Arc::clone(&running),
            Arc::clone(&shutdown),
        ));

        tracing::debug!(interval_ms = interval.as_millis() as u64, "Started cache cleanup task");
        Some(Self {
            running,
            shutdown,
            handle: Some(handle),
            interval,
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
            && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Ask the task to exit and wait until it has, without interrupting a shard scan
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Release);
        self.shutdown.notify_one();

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    tracing::warn!(error = %e, "Cache cleanup task ended abnormally");
                }
            }
        }
        tracing::debug!("Stopped cache cleanup task");
    }
}

impl Drop for CleanupScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for CleanupScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupScheduler")
            .field("interval", &self.interval)
            .field("running", &self.running.load(Ordering::Relaxed))
            .finish()
    }
}

async fn run(
    cache: Weak<CacheInner>,
    period: Duration,
    running: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            () = shutdown.notified() => break,
        }
        if !running.load(Ordering::Acquire) {
            break;
        }

        let shard_count = match cache.upgrade() {
            Some(inner) => inner.shards.len(),
            None => break,
        };

        let started = Instant::now();
        let mut removed = 0;
        for index in 0..shard_count {
            if !running.load(Ordering::Acquire) {
                break;
            }
            let Some(inner) = cache.upgrade() else {
                return;
            };
            removed += inner.sweep_shard(index, Instant::now()).removed;
            drop(inner);

            tokio::task::yield_now().await;
        }

        tracing::debug!(
            removed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Cache cleanup sweep finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::config::CacheConfigBuilder;
    use crate::errors::Result;
    use crate::ShardedCache;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_sweep_removes_unread_entries() -> Result<()> {
        let cache = ShardedCache::new(
            CacheConfigBuilder::new()
                .with_shard_count(4)
                .with_cleanup_interval(Duration::from_millis(100))
                .build(),
        )?;
        assert!(cache.cleanup_running());

        cache.set("short", json!("gone soon"), Some(Duration::from_millis(50)))?;
        cache.set("long", json!("stays"), Some(Duration::from_secs(60)))?;

        tokio::time::sleep(Duration::from_millis(450)).await;

        // Never read, so only the sweep can have removed it
        assert_eq!(cache.size(), 1);
        assert_eq!(cache.get_detailed_metrics().counters.expirations, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_stop_waits_for_task() -> Result<()> {
        let cache = ShardedCache::new(
            CacheConfigBuilder::new()
                .with_cleanup_interval(Duration::from_millis(10))
                .build(),
        )?;
        assert!(cache.cleanup_running());

        cache.stop_cleanup().await;
        assert!(!cache.cleanup_running());

        // Stopping twice is harmless
        cache.stop_cleanup().await;
        Ok(())
    }

    #[test]
    fn test_no_runtime_means_no_task() -> Result<()> {
        let cache = ShardedCache::new(
            CacheConfigBuilder::new()
                .with_cleanup_interval(Duration::from_secs(1))
                .build(),
        )?;
        assert!(!cache.cleanup_running());
        Ok(())
    }

    #[tokio::test]
    async fn test_zero_interval_disables_task() -> Result<()> {
        let cache = ShardedCache::new(
            CacheConfigBuilder::new()
                .with_cleanup_interval(Duration::ZERO)
                .build(),
        )?;
        assert!(!cache.cleanup_running());
        Ok(())
    }
}
