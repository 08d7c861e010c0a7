//! WAL replay functionality
//!
//! This module handles replaying WAL records for crash recovery.

use super::operations::WalRecord;
use crate::errors::{CacheError, Result};
use crate::storage::format::{validate_header, MAX_WAL_RECORD_SIZE, WAL_HEADER_LEN};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, Read as IoRead};
use std::path::Path;

/// Outcome of a replay pass
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    /// Records handed to the callback
    pub applied: u64,
    /// Records skipped because their sequence did not increase
    pub rejected: u64,
    /// Highest sequence applied
    pub last_sequence: u64,
    /// Whether replay stopped at a torn or corrupt frame
    pub truncated_tail: bool,
    /// Byte length of the valid prefix of the file
    pub valid_len: u64,
}

/// Replay WAL records from a file in ascending sequence order.
///
/// A missing file replays nothing. Reading stops at the first torn or
/// corrupt frame; records whose sequence is not strictly greater than the
/// last applied one are rejected and never reach `callback`.
pub fn replay_from_file<F>(path: &Path, mut callback: F) -> Result<ReplayStats>
where
    F: FnMut(&WalRecord),
{
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ReplayStats::default()),
        Err(e) => return Err(CacheError::io(path, "open WAL for replay", e)),
    };

    let file_len = file
        .metadata()
        .map_err(|e| CacheError::io(path, "stat WAL for replay", e))?
        .len();
    let mut stats = ReplayStats::default();
    let mut reader = BufReader::new(file);

    let mut header = [0u8; WAL_HEADER_LEN];
    match reader.read_exact(&mut header) {
        Ok(()) => validate_header(&header)?,
        // Empty or header-less file: nothing to replay
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(stats),
        Err(e) => return Err(CacheError::io(path, "read WAL header", e)),
    }
    stats.valid_len = WAL_HEADER_LEN as u64;

    loop {
        let mut len_bytes = [0u8; 4];
        match reader.read_exact(&mut len_bytes) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                // Leftover bytes shorter than a length prefix are a torn frame
                stats.truncated_tail = stats.valid_len < file_len;
                break;
            }
            Err(e) => return Err(CacheError::io(path, "read WAL frame length", e)),
        }

        let len = u32::from_le_bytes(len_bytes) as usize;
        if len == 0 || len > MAX_WAL_RECORD_SIZE {
            tracing::warn!(len, "WAL frame length out of range");
            stats.truncated_tail = true;
            break;
        }

        let mut record_bytes = vec![0u8; len];
        if let Err(e) = reader.read_exact(&mut record_bytes) {
            tracing::warn!(error = %e, "WAL replay error reading record");
            stats.truncated_tail = true;
            break;
        }

        let record = match WalRecord::decode(&record_bytes) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "WAL record failed verification");
                stats.truncated_tail = true;
                break;
            }
        };
        stats.valid_len += 4 + len as u64;

        if record.sequence <= stats.last_sequence {
            tracing::warn!(
                sequence = record.sequence,
                last_sequence = stats.last_sequence,
                "Rejecting out-of-order WAL record"
            );
            stats.rejected += 1;
            continue;
        }

        callback(&record);
        stats.applied += 1;
        stats.last_sequence = record.sequence;
    }

    if stats.truncated_tail {
        tracing::warn!(
            path = %path.display(),
            valid_len = stats.valid_len,
            "WAL corruption detected, replay stopped at last valid record"
        );
    }

    Ok(stats)
}
