//! Input validation for keys, values and TTLs
//!
//! Typed callers go through [`validate_key`], [`validate_value`] and
//! [`validate_ttl`]. Callers forwarding untyped JSON payloads use
//! [`parse_key`] and [`parse_ttl`], which additionally report type errors.

use crate::errors::ValidationError;
use serde_json::Value;
use std::time::Duration;

/// Longest accepted key, in characters
pub const MAX_KEY_LENGTH: usize = 1000;

/// Longest accepted TTL (365 days)
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

pub fn validate_key(key: &str) -> Result<&str, ValidationError> {
    if key.is_empty() {
        return Err(ValidationError::EmptyKey);
    }
    let len = key.chars().count();
    if len > MAX_KEY_LENGTH {
        return Err(ValidationError::KeyTooLong {
            len,
            max: MAX_KEY_LENGTH,
        });
    }
    if let Some(found) = key.chars().find(|c| c.is_ascii_control()) {
        return Err(ValidationError::InvalidKeyChars { found });
    }
    Ok(key)
}

pub fn validate_value(value: &Value) -> Result<(), ValidationError> {
    if value.is_null() {
        return Err(ValidationError::InvalidValue);
    }
    Ok(())
}

pub fn validate_ttl(ttl: Duration) -> Result<Duration, ValidationError> {
    if ttl > MAX_TTL {
        return Err(ValidationError::TtlTooLarge {
            seconds: ttl.as_secs_f64(),
            max_seconds: MAX_TTL.as_secs(),
        });
    }
    Ok(ttl)
}

/// Validate a TTL given in (possibly fractional, possibly negative) seconds
pub fn ttl_from_secs(seconds: f64) -> Result<Duration, ValidationError> {
    if seconds.is_nan() {
        return Err(ValidationError::InvalidTtlType { found: "NaN" });
    }
    if seconds < 0.0 {
        return Err(ValidationError::NegativeTtl { seconds });
    }
    if seconds > MAX_TTL.as_secs_f64() {
        return Err(ValidationError::TtlTooLarge {
            seconds,
            max_seconds: MAX_TTL.as_secs(),
        });
    }
    Ok(Duration::from_secs_f64(seconds))
}

/// Extract and validate a key from an untyped payload
pub fn parse_key(key: &Value) -> Result<&str, ValidationError> {
    match key {
        Value::String(s) => validate_key(s),
        other => Err(ValidationError::InvalidKeyType {
            found: json_type_name(other),
        }),
    }
}

/// Extract and validate a TTL from an untyped payload; `null` means "use the default"
pub fn parse_ttl(ttl: &Value) -> Result<Option<Duration>, ValidationError> {
    match ttl {
        Value::Null => Ok(None),
        Value::Number(n) => match n.as_f64() {
            Some(seconds) => ttl_from_secs(seconds).map(Some),
            None => Err(ValidationError::InvalidTtlType { found: "number" }),
        },
        other => Err(ValidationError::InvalidTtlType {
            found: json_type_name(other),
        }),
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
