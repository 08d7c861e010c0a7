//! Core error types for the cache engine

use super::validation::ValidationError;
use std::path::PathBuf;

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Re-export CacheError as Error for convenience
pub use CacheError as Error;

/// Operational and validation failures surfaced by the engine
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Caller supplied an invalid key, value or TTL
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// I/O errors while touching the write-ahead log or snapshot files
    #[error("I/O error during {operation} on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Serialization/deserialization errors
    #[error("failed to serialize {context}: {source}")]
    Serialization {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Persisted data failed an integrity check
    #[error("corruption detected: {reason}")]
    Corruption { reason: String },

    /// A backing store (WAL) cannot accept work
    #[error("store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    /// Snapshot does not have the expected structure
    #[error("malformed snapshot: {reason}")]
    SnapshotFormat { reason: String },

    /// Snapshot was produced by an incompatible format version
    #[error("snapshot format version mismatch: expected v{expected}, found v{actual}")]
    VersionMismatch { expected: u32, actual: u32 },

    /// A rollback batch contained an operation that could not be applied
    #[error("malformed rollback operation at index {index} ({applied} already applied): {reason}")]
    MalformedRollback {
        index: usize,
        applied: usize,
        reason: String,
    },

    /// Configuration error
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl CacheError {
    /// Build a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Build a snapshot format error
    #[must_use]
    pub fn snapshot_format(reason: impl Into<String>) -> Self {
        Self::SnapshotFormat {
            reason: reason.into(),
        }
    }

    /// Build an I/O error carrying the path and operation that failed
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, operation: &'static str, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            operation,
            source,
        }
    }

    /// Validation error kind, if this is a validation failure
    #[must_use]
    pub fn validation_kind(&self) -> Option<&'static str> {
        match self {
            Self::Validation(e) => Some(e.kind()),
            _ => None,
        }
    }
}
