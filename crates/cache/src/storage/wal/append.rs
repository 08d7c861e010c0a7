//! WAL append operations
//!
//! This module handles appending framed records to the write-ahead log.

use super::operations::{WalOperation, WalRecord};
use crate::errors::{CacheError, Result};
use std::fs::File;
use std::io::Write as IoWrite;
use std::path::Path;

/// Mutable state guarded by the WAL mutex
pub(super) struct WalState {
    pub file: Option<File>,
    pub last_sequence: u64,
    pub size: u64,
}

/// Build a `[len][record]` frame
pub(super) fn encode_frame(record: &WalRecord) -> Result<Vec<u8>> {
    let bytes = record.encode()?;
    let len = u32::try_from(bytes.len()).map_err(|_| CacheError::Serialization {
        context: format!("WAL record {}", record.sequence),
        source: format!("record of {} bytes does not fit a frame", bytes.len()).into(),
    })?;

    let mut frame = Vec::with_capacity(4 + bytes.len());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&bytes);
    Ok(frame)
}

/// Append an operation, returning its sequence number.
///
/// The sequence counter only advances when the frame reached the file; a
/// failed write is rolled back to the previous length so later frames never
/// follow a torn one.
pub(super) fn append_operation(
    op: &WalOperation,
    path: &Path,
    state: &mut WalState,
    sync: bool,
) -> Result<u64> {
    let file = match state.file.as_mut() {
        Some(f) => f,
        None => {
            return Err(CacheError::StoreUnavailable {
                reason: format!("WAL '{}' is closed", path.display()),
            });
        }
    };

    let seq = state.last_sequence + 1;
    let record = WalRecord::new(seq, op.clone());
    let frame = encode_frame(&record)?;

    let written = file.write_all(&frame).and_then(|()| {
        if sync {
            file.sync_data()
        } else {
            file.flush()
        }
    });

    if let Err(e) = written {
        if let Err(truncate_err) = file.set_len(state.size) {
            tracing::warn!(
                path = %path.display(),
                error = %truncate_err,
                "Failed to truncate WAL after a failed append"
            );
        }
        return Err(CacheError::io(path, "append WAL record", e));
    }

    state.last_sequence = seq;
    state.size += frame.len() as u64;
    Ok(seq)
}
