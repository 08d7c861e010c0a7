//! Snapshot persistence as JSON files

use super::Snapshot;
use crate::errors::{CacheError, Result};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;

impl Snapshot {
    /// Write the snapshot as pretty JSON, atomically replacing `path`
    pub async fn write_to(&self, path: &Path) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(self).map_err(|e| CacheError::Serialization {
            context: format!("snapshot for '{}'", path.display()),
            source: Box::new(e),
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CacheError::io(parent, "create snapshot directory", e))?;
        }

        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let temp_path = path.with_extension(format!("tmp.{}.{nonce}", std::process::id()));

        fs::write(&temp_path, &bytes)
            .await
            .map_err(|e| CacheError::io(&temp_path, "write snapshot file", e))?;

        if let Err(e) = fs::rename(&temp_path, path).await {
            // Clean up temp file
            let _ = fs::remove_file(&temp_path).await;
            return Err(CacheError::io(path, "atomic rename", e));
        }

        tracing::debug!(
            path = %path.display(),
            entries = self.len(),
            bytes = bytes.len(),
            "Wrote snapshot file"
        );
        Ok(())
    }

    /// Read and structurally validate a snapshot file
    pub async fn read_from(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .await
            .map_err(|e| CacheError::io(path, "read snapshot file", e))?;
        let document: serde_json::Value = serde_json::from_slice(&bytes).map_err(|e| {
            CacheError::snapshot_format(format!("'{}' is not JSON: {e}", path.display()))
        })?;
        Self::from_json(&document)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::CacheConfigBuilder;
    use crate::errors::{CacheError, Result};
    use crate::snapshot::Snapshot;
    use crate::ShardedCache;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_and_read_back() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("backups").join("cache.json");

        let cache = ShardedCache::new(
            CacheConfigBuilder::new()
                .with_cleanup_interval(Duration::ZERO)
                .build(),
        )?;
        cache.set("alpha", json!({"nested": [1, 2]}), None)?;
        cache.set("beta", json!(3.5), None)?;

        let snapshot = cache.create_backup_snapshot();
        snapshot.write_to(&path).await?;

        let read = Snapshot::read_from(&path).await?;
        assert_eq!(read, snapshot);

        // No temp files left next to the snapshot
        let names: Vec<_> = std::fs::read_dir(dir.path().join("backups"))?
            .filter_map(|e| e.ok())
            .map(|e| e.file_name())
            .collect();
        assert_eq!(names.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_garbage_file_is_a_format_error() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("broken.json");
        std::fs::write(&path, b"{ not json")?;

        let result = Snapshot::read_from(&path).await;
        assert!(matches!(result, Err(CacheError::SnapshotFormat { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file_is_an_io_error() {
        let result = Snapshot::read_from(std::path::Path::new("/nonexistent/snapshot.json")).await;
        assert!(matches!(result, Err(CacheError::Io { .. })));
    }
}
