//! Input validation errors

/// Caller-side input mistakes, one variant per rejected condition
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Key was absent, null or not a string
    #[error("cache key must be a string, got {found}")]
    InvalidKeyType { found: &'static str },

    #[error("cache key must not be empty")]
    EmptyKey,

    #[error("cache key is {len} characters, maximum is {max}")]
    KeyTooLong { len: usize, max: usize },

    /// Key contains newline, carriage return, NUL or another control character
    #[error("cache key contains control character {found:?}")]
    InvalidKeyChars { found: char },

    #[error("cache value must not be null")]
    InvalidValue,

    #[error("ttl must not be negative, got {seconds}s")]
    NegativeTtl { seconds: f64 },

    #[error("ttl of {seconds}s exceeds maximum of {max_seconds}s")]
    TtlTooLarge { seconds: f64, max_seconds: u64 },

    #[error("ttl must be a number of seconds, got {found}")]
    InvalidTtlType { found: &'static str },
}

impl ValidationError {
    /// Stable name of the rejected condition
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidKeyType { .. } => "InvalidKeyType",
            Self::EmptyKey => "EmptyKey",
            Self::KeyTooLong { .. } => "KeyTooLong",
            Self::InvalidKeyChars { .. } => "InvalidKeyChars",
            Self::InvalidValue => "InvalidValue",
            Self::NegativeTtl { .. } => "NegativeTTL",
            Self::TtlTooLarge { .. } => "TTLTooLarge",
            Self::InvalidTtlType { .. } => "InvalidTTLType",
        }
    }
}
