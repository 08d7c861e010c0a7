//! Cache operations module
//!
//! Operations are implemented directly on [`ShardedCache`].

mod get;
mod maintenance;
mod put;
mod remove;
mod stats;

use crate::errors::{CacheError, ValidationError};

use super::types::ShardedCache;

impl ShardedCache {
    /// Count a rejected input and convert it into the caller-facing error
    pub(super) fn reject(&self, error: ValidationError) -> CacheError {
        self.inner.metrics.record_validation_error();
        tracing::debug!(kind = error.kind(), error = %error, "Rejected cache operation input");
        CacheError::Validation(error)
    }
}
