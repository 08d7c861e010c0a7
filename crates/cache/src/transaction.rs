//! Compensating-transaction rollback
//!
//! A rollback descriptor records the state a key must be returned to, not the
//! operation that was applied. Descriptors are applied in order; the first
//! malformed one stops the batch and compensations already applied stay
//! applied.

use crate::core::{Origin, ShardedCache};
use crate::errors::{CacheError, Result};
use crate::validation::{json_type_name, parse_ttl, validate_key, validate_ttl};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Kind of operation being compensated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollbackKind {
    /// Undo a set: restore the previous value, or delete if there was none
    Set,
    /// Undo a delete: re-insert the previous value
    Delete,
}

impl RollbackKind {
    fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "set" => Some(Self::Set),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// State to restore for one key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollbackOperation {
    pub op: RollbackKind,
    pub key: String,
    /// Value before the compensated operation; `None` if the key did not exist
    pub previous_value: Option<Value>,
    /// TTL to restore with; the configured default when `None`
    pub previous_ttl: Option<Duration>,
}

impl RollbackOperation {
    /// Compensate a set of `key` that replaced `previous_value`
    pub fn undo_set(key: impl Into<String>, previous_value: Option<Value>, previous_ttl: Option<Duration>) -> Self {
        Self {
            op: RollbackKind::Set,
            key: key.into(),
            previous_value,
            previous_ttl,
        }
    }

    /// Compensate a delete of `key` that removed `previous_value`
    pub fn undo_delete(key: impl Into<String>, previous_value: Value, previous_ttl: Option<Duration>) -> Self {
        Self {
            op: RollbackKind::Delete,
            key: key.into(),
            previous_value: Some(previous_value),
            previous_ttl,
        }
    }
}

/// What a single descriptor does once checked
enum Compensation<'a> {
    Restore {
        key: &'a str,
        value: Value,
        ttl: Duration,
    },
    Remove {
        key: &'a str,
    },
}

impl ShardedCache {
    /// Apply compensations in order, returning how many were applied.
    ///
    /// An empty batch is a no-op. The first malformed descriptor stops the
    /// batch with [`CacheError::MalformedRollback`].
    pub fn rollback_transaction(&self, operations: &[RollbackOperation]) -> Result<usize> {
        let mut applied = 0;
        for (index, operation) in operations.iter().enumerate() {
            let compensation = self
                .check_compensation(operation)
                .map_err(|reason| malformed(index, applied, reason))?;
            self.apply_compensation(compensation);
            applied += 1;
        }

        if applied > 0 {
            tracing::info!(applied, "Rolled back cache transaction");
        }
        Ok(applied)
    }

    /// [`rollback_transaction`](Self::rollback_transaction) for an untyped descriptor list.
    ///
    /// Expects an array of objects with `op` (`"set"` or `"delete"`), `key`,
    /// and optional `previous_value` and `previous_ttl` (seconds).
    pub fn rollback_transaction_json(&self, operations: &Value) -> Result<usize> {
        let items = operations.as_array().ok_or_else(|| {
            malformed(
                0,
                0,
                format!(
                    "expected an array of operations, found {}",
                    json_type_name(operations)
                ),
            )
        })?;

        let mut applied = 0;
        for (index, item) in items.iter().enumerate() {
            let operation = parse_descriptor(item).map_err(|reason| malformed(index, applied, reason))?;
            let compensation = self
                .check_compensation(&operation)
                .map_err(|reason| malformed(index, applied, reason))?;
            self.apply_compensation(compensation);
            applied += 1;
        }

        if applied > 0 {
            tracing::info!(applied, "Rolled back cache transaction");
        }
        Ok(applied)
    }

    fn check_compensation<'a>(
        &self,
        operation: &'a RollbackOperation,
    ) -> std::result::Result<Compensation<'a>, String> {
        let key = validate_key(&operation.key).map_err(|e| e.to_string())?;
        let ttl = match operation.previous_ttl {
            Some(ttl) => validate_ttl(ttl).map_err(|e| e.to_string())?,
            None => self.inner.config.default_ttl,
        };

        let previous = operation
            .previous_value
            .as_ref()
            .filter(|value| !value.is_null());

        match (operation.op, previous) {
            (_, Some(value)) => Ok(Compensation::Restore {
                key,
                value: value.clone(),
                ttl,
            }),
            (RollbackKind::Set, None) => Ok(Compensation::Remove { key }),
            (RollbackKind::Delete, None) => {
                Err("delete compensation requires a previous_value".to_string())
            }
        }
    }

    fn apply_compensation(&self, compensation: Compensation<'_>) {
        match compensation {
            Compensation::Restore { key, value, ttl } => {
                self.inner.insert(key, value, ttl, Origin::Live);
            }
            Compensation::Remove { key } => {
                self.inner.remove(key, Origin::Live);
            }
        }
    }
}

fn malformed(index: usize, applied: usize, reason: String) -> CacheError {
    tracing::warn!(index, applied, reason = %reason, "Malformed rollback operation");
    CacheError::MalformedRollback {
        index,
        applied,
        reason,
    }
}

fn parse_descriptor(item: &Value) -> std::result::Result<RollbackOperation, String> {
    let fields: &Map<String, Value> = item
        .as_object()
        .ok_or_else(|| format!("expected an object, found {}", json_type_name(item)))?;

    let op = match fields.get("op") {
        Some(Value::String(name)) => {
            RollbackKind::parse(name).ok_or_else(|| format!("unknown operation '{name}'"))?
        }
        Some(other) => return Err(format!("'op' must be a string, found {}", json_type_name(other))),
        None => return Err("missing 'op'".to_string()),
    };

    let key = match fields.get("key") {
        Some(Value::String(key)) => key.clone(),
        Some(other) => return Err(format!("'key' must be a string, found {}", json_type_name(other))),
        None => return Err("missing 'key'".to_string()),
    };

    let previous_ttl = match fields.get("previous_ttl") {
        Some(ttl) => parse_ttl(ttl).map_err(|e| e.to_string())?,
        None => None,
    };

    Ok(RollbackOperation {
        op,
        key,
        previous_value: fields.get("previous_value").cloned(),
        previous_ttl,
    })
}
