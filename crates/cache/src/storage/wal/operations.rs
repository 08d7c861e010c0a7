//! WAL operation types and records
//!
//! This module defines the mutations that can be recorded
//! in the Write-Ahead Log for crash recovery.

use crate::errors::{CacheError, Result};
use crc32c::crc32c;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, SystemTime};

/// A durable mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WalOperation {
    /// Insert or replace an entry. The value is stored as JSON text since
    /// bincode cannot decode self-describing values.
    Set {
        key: String,
        value_json: String,
        ttl: Duration,
    },
    /// Remove an entry
    Delete { key: String },
    /// Remove every entry
    Clear,
}

impl WalOperation {
    pub fn set(key: &str, value: &Value, ttl: Duration) -> Result<Self> {
        let value_json = serde_json::to_string(value).map_err(|e| CacheError::Serialization {
            context: format!("WAL value for key '{key}'"),
            source: Box::new(e),
        })?;
        Ok(Self::Set {
            key: key.to_string(),
            value_json,
            ttl,
        })
    }

    pub fn delete(key: &str) -> Self {
        Self::Delete {
            key: key.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Set { .. } => "SET",
            Self::Delete { .. } => "DELETE",
            Self::Clear => "CLEAR",
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Set { key, .. } | Self::Delete { key } => Some(key),
            Self::Clear => None,
        }
    }

    /// Decode the stored value of a `Set`
    pub fn value(&self) -> Result<Option<Value>> {
        match self {
            Self::Set { key, value_json, .. } => serde_json::from_str(value_json)
                .map(Some)
                .map_err(|e| CacheError::Serialization {
                    context: format!("WAL value for key '{key}'"),
                    source: Box::new(e),
                }),
            _ => Ok(None),
        }
    }
}

/// WAL record with sequencing and integrity metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalRecord {
    pub sequence: u64,
    pub timestamp: SystemTime,
    pub operation: WalOperation,
    pub crc: u32,
}

impl WalRecord {
    pub fn new(sequence: u64, operation: WalOperation) -> Self {
        Self {
            sequence,
            timestamp: SystemTime::now(),
            operation,
            crc: 0,
        }
    }

    /// CRC32C over the record serialized with a zeroed CRC field
    fn checksum(&self) -> Result<u32> {
        let mut unsealed = self.clone();
        unsealed.crc = 0;
        let bytes = bincode::serialize(&unsealed)?;
        Ok(crc32c(&bytes))
    }

    /// Serialize with the CRC field filled in
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut sealed = self.clone();
        sealed.crc = self.checksum()?;
        Ok(bincode::serialize(&sealed)?)
    }

    /// Deserialize and verify the CRC
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let record: WalRecord = bincode::deserialize(bytes)?;
        let expected = record.checksum()?;
        if record.crc != expected {
            return Err(CacheError::Corruption {
                reason: format!(
                    "WAL record {} CRC mismatch: expected {:08x}, got {:08x}",
                    record.sequence, expected, record.crc
                ),
            });
        }
        Ok(record)
    }
}
