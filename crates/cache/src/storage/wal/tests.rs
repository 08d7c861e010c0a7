//! Tests for the write-ahead log

use super::*;
use crate::config::WalConfig;
use crate::errors::{CacheError, Result};
use crate::storage::format::WAL_HEADER_LEN;
use serde_json::json;
use std::fs::OpenOptions;
use std::io::Write;
use std::time::Duration;
use tempfile::TempDir;

fn open_wal(dir: &TempDir) -> Result<WriteAheadLog> {
    WriteAheadLog::open(&WalConfig::new(dir.path().join("wal").join("cache.wal")))
}

fn collect(wal: &WriteAheadLog) -> Result<(Vec<WalRecord>, ReplayStats)> {
    let mut records = Vec::new();
    let stats = wal.replay(|record| records.push(record.clone()))?;
    Ok((records, stats))
}

#[test]
fn test_append_and_replay_in_order() -> Result<()> {
    let dir = TempDir::new()?;
    let wal = open_wal(&dir)?;

    let s1 = wal.append(&WalOperation::set("a", &json!(1), Duration::from_secs(60))?)?;
    let s2 = wal.append(&WalOperation::delete("a"))?;
    let s3 = wal.append(&WalOperation::Clear)?;
    assert_eq!((s1, s2, s3), (1, 2, 3));

    let (records, stats) = collect(&wal)?;
    assert_eq!(stats.applied, 3);
    assert_eq!(stats.rejected, 0);
    assert!(!stats.truncated_tail);
    assert_eq!(
        records.iter().map(|r| r.sequence).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(records[0].operation.value()?, Some(json!(1)));
    assert_eq!(records[1].operation, WalOperation::delete("a"));
    Ok(())
}

#[test]
fn test_sequence_resumes_after_reopen() -> Result<()> {
    let dir = TempDir::new()?;
    {
        let wal = open_wal(&dir)?;
        wal.append(&WalOperation::delete("x"))?;
        wal.append(&WalOperation::delete("y"))?;
        wal.close()?;
    }

    let wal = open_wal(&dir)?;
    assert_eq!(wal.last_sequence(), 2);
    assert_eq!(wal.append(&WalOperation::delete("z"))?, 3);
    Ok(())
}

#[test]
fn test_append_after_close_degrades() -> Result<()> {
    let dir = TempDir::new()?;
    let wal = open_wal(&dir)?;
    wal.close()?;
    assert!(wal.is_closed());

    let result = wal.append(&WalOperation::delete("k"));
    assert!(matches!(result, Err(CacheError::StoreUnavailable { .. })));

    let stats = wal.stats();
    assert!(stats.degraded);
    assert_eq!(stats.failures, 1);
    assert_eq!(stats.appends, 0);
    Ok(())
}

#[test]
fn test_torn_tail_is_truncated_on_open() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("wal").join("cache.wal");
    {
        let wal = open_wal(&dir)?;
        wal.append(&WalOperation::delete("kept"))?;
    }

    // Simulate a crash mid-frame: a length prefix with too few payload bytes
    {
        let mut file = OpenOptions::new().append(true).open(&path)?;
        file.write_all(&200u32.to_le_bytes())?;
        file.write_all(&[1, 2, 3])?;
    }

    let wal = open_wal(&dir)?;
    assert_eq!(wal.last_sequence(), 1);
    wal.append(&WalOperation::delete("after-crash"))?;

    let (records, stats) = collect(&wal)?;
    assert!(!stats.truncated_tail);
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].operation, WalOperation::delete("after-crash"));
    Ok(())
}

#[test]
fn test_out_of_order_records_are_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("wal").join("cache.wal");
    {
        let wal = open_wal(&dir)?;
        wal.append(&WalOperation::delete("one"))?;
        wal.append(&WalOperation::delete("two"))?;
    }

    // Append a duplicate of sequence 1 by hand
    {
        let record = WalRecord::new(1, WalOperation::delete("dup"));
        let bytes = record.encode()?;
        let mut file = OpenOptions::new().append(true).open(&path)?;
        file.write_all(&(bytes.len() as u32).to_le_bytes())?;
        file.write_all(&bytes)?;
    }

    let wal = open_wal(&dir)?;
    let (records, stats) = collect(&wal)?;
    assert_eq!(stats.applied, 2);
    assert_eq!(stats.rejected, 1);
    assert!(records
        .iter()
        .all(|r| r.operation != WalOperation::delete("dup")));
    Ok(())
}

#[test]
fn test_foreign_file_is_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("not-a-wal");
    std::fs::write(&path, b"hello world, definitely not a log")?;

    let result = WriteAheadLog::open(&WalConfig::new(&path));
    assert!(matches!(result, Err(CacheError::Corruption { .. })));
    Ok(())
}

#[test]
fn test_new_file_gets_header() -> Result<()> {
    let dir = TempDir::new()?;
    let wal = open_wal(&dir)?;
    let len = std::fs::metadata(wal.path())?.len();
    assert_eq!(len, WAL_HEADER_LEN as u64);
    Ok(())
}
