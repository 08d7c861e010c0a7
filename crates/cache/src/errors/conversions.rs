//! Error conversion utilities

use super::types::CacheError;
use std::path::PathBuf;

impl From<std::io::Error> for CacheError {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("."),
            operation: "unknown",
            source: error,
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization {
            context: "json document".to_string(),
            source: Box::new(error),
        }
    }
}

impl From<bincode::Error> for CacheError {
    fn from(error: bincode::Error) -> Self {
        Self::Serialization {
            context: "binary record".to_string(),
            source: error,
        }
    }
}
