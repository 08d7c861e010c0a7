//! Durable storage for cache mutations
//!
//! The write-ahead log records every live mutation as a length-prefixed,
//! CRC32C-protected bincode frame so that a restarted cache can replay it.

mod format;
pub mod wal;

pub use format::{MAX_WAL_RECORD_SIZE, WAL_FORMAT_VERSION, WAL_HEADER_LEN, WAL_MAGIC};
pub use wal::{ReplayStats, WalOperation, WalRecord, WalStats, WriteAheadLog};
