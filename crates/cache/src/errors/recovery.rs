//! Recovery utilities for cache errors

use super::types::CacheError;
use std::path::PathBuf;
use std::time::Duration;

/// What a caller can do about a failed operation
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryHint {
    /// Retry the operation after a delay
    Retry { after: Duration },

    /// Check file permissions
    CheckPermissions { path: PathBuf },

    /// Clear the affected state and retry
    ClearAndRetry,

    /// The caller must correct its input
    FixInput,

    /// Update cache configuration
    UpdateConfiguration,

    /// Operation can be safely ignored; the cache keeps serving
    Ignore,

    /// No automated recovery possible
    Manual { instructions: String },
}

impl CacheError {
    /// Get the recovery hint for this error
    #[must_use]
    pub fn recovery_hint(&self) -> RecoveryHint {
        match self {
            Self::Validation(_) | Self::MalformedRollback { .. } => RecoveryHint::FixInput,
            Self::Io { path, source, .. } => match source.kind() {
                std::io::ErrorKind::PermissionDenied => {
                    RecoveryHint::CheckPermissions { path: path.clone() }
                }
                std::io::ErrorKind::Interrupted
                | std::io::ErrorKind::WouldBlock
                | std::io::ErrorKind::TimedOut => RecoveryHint::Retry {
                    after: Duration::from_millis(10),
                },
                _ => RecoveryHint::Manual {
                    instructions: format!("Check disk space and access to {}", path.display()),
                },
            },
            Self::Serialization { .. } => RecoveryHint::Ignore,
            Self::Corruption { .. } => RecoveryHint::ClearAndRetry,
            Self::StoreUnavailable { .. } => RecoveryHint::Retry {
                after: Duration::from_millis(10),
            },
            Self::SnapshotFormat { .. } | Self::VersionMismatch { .. } => RecoveryHint::Manual {
                instructions: "Recreate the snapshot with a compatible engine version".to_string(),
            },
            Self::Configuration { .. } => RecoveryHint::UpdateConfiguration,
        }
    }

    /// Check if this error is a caller input mistake
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error is transient and can be retried
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self.recovery_hint(), RecoveryHint::Retry { .. })
    }

    /// Check if this error indicates persisted data corruption
    #[must_use]
    pub const fn is_corruption(&self) -> bool {
        matches!(self, Self::Corruption { .. })
    }
}
