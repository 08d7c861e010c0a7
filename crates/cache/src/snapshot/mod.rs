//! Point-in-time images of cache contents
//!
//! A [`Snapshot`] is a detached, self-describing copy of every live entry,
//! grouped by the shard it was read from. Restoring re-routes keys through
//! the target cache's router, so snapshots move between caches with
//! different shard counts.

mod file;
mod manager;

use crate::errors::{CacheError, Result};
use crate::validation::json_type_name;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current snapshot format version
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// Number of entries across all shards
    pub total_entries: u64,
    pub created_at: DateTime<Utc>,
    pub format_version: u32,
    /// Shard count of the cache the snapshot was taken from
    #[serde(default)]
    pub shard_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub key: String,
    pub value: Value,
    /// TTL left when the snapshot was taken
    pub ttl_remaining_ms: u64,
}

/// Versioned image of all live entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub metadata: SnapshotMetadata,
    /// Entries per source shard, least recently used first
    pub shards: Vec<Vec<SnapshotEntry>>,
}

impl Snapshot {
    pub fn entries(&self) -> impl Iterator<Item = &SnapshotEntry> {
        self.shards.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_json(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| CacheError::Serialization {
            context: "snapshot".to_string(),
            source: Box::new(e),
        })
    }

    /// Parse an untyped snapshot document, rejecting anything with the wrong shape.
    ///
    /// Only structure is checked here; version compatibility and entry counts
    /// are checked on restore.
    pub fn from_json(value: &Value) -> Result<Self> {
        let root = value
            .as_object()
            .ok_or_else(|| shape_error("snapshot", "an object", value))?;

        let metadata = root
            .get("metadata")
            .ok_or_else(|| CacheError::snapshot_format("missing 'metadata'"))?;
        let metadata_fields = metadata
            .as_object()
            .ok_or_else(|| shape_error("metadata", "an object", metadata))?;

        for (field, expected) in [
            ("total_entries", "an unsigned integer"),
            ("format_version", "an unsigned integer"),
        ] {
            let v = metadata_fields
                .get(field)
                .ok_or_else(|| CacheError::snapshot_format(format!("missing 'metadata.{field}'")))?;
            if !v.is_u64() {
                return Err(shape_error(&format!("metadata.{field}"), expected, v));
            }
        }
        match metadata_fields.get("created_at") {
            Some(Value::String(_)) => {}
            Some(other) => return Err(shape_error("metadata.created_at", "a string", other)),
            None => return Err(CacheError::snapshot_format("missing 'metadata.created_at'")),
        }

        let shards = root
            .get("shards")
            .ok_or_else(|| CacheError::snapshot_format("missing 'shards'"))?;
        let shards = shards
            .as_array()
            .ok_or_else(|| shape_error("shards", "an array", shards))?;

        for (shard_index, shard) in shards.iter().enumerate() {
            let entries = shard
                .as_array()
                .ok_or_else(|| shape_error(&format!("shards[{shard_index}]"), "an array", shard))?;
            for (entry_index, entry) in entries.iter().enumerate() {
                check_entry(entry, &format!("shards[{shard_index}][{entry_index}]"))?;
            }
        }

        serde_json::from_value(value.clone())
            .map_err(|e| CacheError::snapshot_format(format!("invalid snapshot: {e}")))
    }
}

fn check_entry(entry: &Value, at: &str) -> Result<()> {
    let fields = entry
        .as_object()
        .ok_or_else(|| shape_error(at, "an object", entry))?;

    match fields.get("key") {
        Some(Value::String(_)) => {}
        Some(other) => return Err(shape_error(&format!("{at}.key"), "a string", other)),
        None => return Err(CacheError::snapshot_format(format!("missing '{at}.key'"))),
    }
    if !fields.contains_key("value") {
        return Err(CacheError::snapshot_format(format!("missing '{at}.value'")));
    }
    match fields.get("ttl_remaining_ms") {
        Some(v) if v.is_u64() => Ok(()),
        Some(other) => Err(shape_error(
            &format!("{at}.ttl_remaining_ms"),
            "an unsigned integer",
            other,
        )),
        None => Err(CacheError::snapshot_format(format!(
            "missing '{at}.ttl_remaining_ms'"
        ))),
    }
}

fn shape_error(at: &str, expected: &str, found: &Value) -> CacheError {
    CacheError::snapshot_format(format!(
        "'{at}' must be {expected}, found {}",
        json_type_name(found)
    ))
}
