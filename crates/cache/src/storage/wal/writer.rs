//! WAL writer implementation
//!
//! This module provides the main write-ahead log functionality.

use super::append::{append_operation, WalState};
use super::operations::{WalOperation, WalRecord};
use super::replay::{replay_from_file, ReplayStats};
use crate::config::WalConfig;
use crate::errors::{CacheError, Result};
use crate::storage::format::{encode_header, WAL_HEADER_LEN};
use parking_lot::Mutex;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Durability counters exposed through metrics and health
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct WalStats {
    pub enabled: bool,
    pub path: Option<PathBuf>,
    pub appends: u64,
    pub failures: u64,
    /// Set by a failed append, cleared by the next successful one
    pub degraded: bool,
    pub last_sequence: u64,
    /// Why durability was switched off when the cache was built
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Append-only durable record of cache mutations.
///
/// Appends are serialized by an internal mutex independent of shard locks.
pub struct WriteAheadLog {
    /// Path to the WAL file
    path: PathBuf,
    sync_on_append: bool,
    state: Mutex<WalState>,
    appends: AtomicU64,
    failures: AtomicU64,
    degraded: AtomicBool,
}

impl WriteAheadLog {
    /// Open or create the log, resuming the sequence after the last valid record.
    ///
    /// A torn tail left by a crash is cut off so new frames follow valid ones.
    pub fn open(config: &WalConfig) -> Result<Self> {
        let path = config.path.clone();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| CacheError::io(parent, "create WAL directory", e))?;
        }

        let scan = replay_from_file(&path, |_| {})?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|e| CacheError::io(&path, "open WAL file", e))?;

        let current_len = file
            .metadata()
            .map_err(|e| CacheError::io(&path, "get WAL metadata", e))?
            .len();

        let size = if scan.valid_len < WAL_HEADER_LEN as u64 {
            // New or header-less file
            file.set_len(0)
                .map_err(|e| CacheError::io(&path, "reset WAL file", e))?;
            file.write_all(&encode_header())
                .and_then(|()| file.sync_data())
                .map_err(|e| CacheError::io(&path, "write WAL header", e))?;
            WAL_HEADER_LEN as u64
        } else {
            if scan.valid_len < current_len {
                tracing::warn!(
                    path = %path.display(),
                    valid_len = scan.valid_len,
                    file_len = current_len,
                    "Truncating torn WAL tail"
                );
                file.set_len(scan.valid_len)
                    .map_err(|e| CacheError::io(&path, "truncate WAL tail", e))?;
            }
            scan.valid_len
        };

        tracing::debug!(
            path = %path.display(),
            last_sequence = scan.last_sequence,
            size,
            "Opened write-ahead log"
        );

        Ok(Self {
            path,
            sync_on_append: config.sync_on_append,
            state: Mutex::new(WalState {
                file: Some(file),
                last_sequence: scan.last_sequence,
                size,
            }),
            appends: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            degraded: AtomicBool::new(false),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Durably append an operation, returning its sequence number
    pub fn append(&self, op: &WalOperation) -> Result<u64> {
        let result = {
            let mut state = self.state.lock();
            append_operation(op, &self.path, &mut state, self.sync_on_append)
        };

        match &result {
            Ok(seq) => {
                self.appends.fetch_add(1, Ordering::Relaxed);
                self.degraded.store(false, Ordering::Relaxed);
                tracing::trace!(sequence = seq, op = op.kind(), "Appended WAL record");
            }
            Err(_) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                self.degraded.store(true, Ordering::Relaxed);
            }
        }
        result
    }

    /// Flush and release the file handle; later appends fail
    pub fn close(&self) -> Result<()> {
        let file = self.state.lock().file.take();
        match file {
            Some(file) => file
                .sync_all()
                .map_err(|e| CacheError::io(&self.path, "sync WAL on close", e)),
            None => Ok(()),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().file.is_none()
    }

    pub fn last_sequence(&self) -> u64 {
        self.state.lock().last_sequence
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    /// Replay every valid record in ascending sequence order
    pub fn replay<F>(&self, callback: F) -> Result<ReplayStats>
    where
        F: FnMut(&WalRecord),
    {
        // Frames are written unbuffered, so the file already holds every append
        replay_from_file(&self.path, callback)
    }

    pub fn stats(&self) -> WalStats {
        WalStats {
            enabled: true,
            path: Some(self.path.clone()),
            appends: self.appends.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            degraded: self.is_degraded(),
            last_sequence: self.last_sequence(),
            error: None,
        }
    }
}

impl Drop for WriteAheadLog {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "Failed to close WAL");
        }
    }
}

impl std::fmt::Debug for WriteAheadLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteAheadLog")
            .field("path", &self.path)
            .field("sync_on_append", &self.sync_on_append)
            .field("last_sequence", &self.last_sequence())
            .finish()
    }
}
