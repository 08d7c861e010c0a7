//! Write-ahead log file format
//!
//! A WAL file starts with a 6-byte header (magic + format version) followed
//! by frames of `[u32 little-endian length][bincode WalRecord]`.

use crate::errors::{CacheError, Result};

/// Magic bytes at the start of every WAL file: "SCWL" (ShardCache WaL)
pub const WAL_MAGIC: [u8; 4] = *b"SCWL";

/// Current WAL format version
pub const WAL_FORMAT_VERSION: u16 = 1;

/// Length of the file header in bytes
pub const WAL_HEADER_LEN: usize = 6;

/// Largest record accepted on replay; anything bigger is treated as a torn frame
pub const MAX_WAL_RECORD_SIZE: usize = 16 * 1024 * 1024;

/// Encode the file header
pub fn encode_header() -> [u8; WAL_HEADER_LEN] {
    let mut header = [0u8; WAL_HEADER_LEN];
    header[..4].copy_from_slice(&WAL_MAGIC);
    header[4..].copy_from_slice(&WAL_FORMAT_VERSION.to_le_bytes());
    header
}

/// Validate a file header read from disk
pub fn validate_header(header: &[u8; WAL_HEADER_LEN]) -> Result<()> {
    if header[..4] != WAL_MAGIC {
        return Err(CacheError::Corruption {
            reason: format!(
                "Invalid WAL magic: expected {:02x?}, got {:02x?}",
                WAL_MAGIC,
                &header[..4]
            ),
        });
    }

    let version = u16::from_le_bytes([header[4], header[5]]);
    if version > WAL_FORMAT_VERSION {
        return Err(CacheError::Corruption {
            reason: format!("Unsupported WAL format version: {version}"),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_validates() {
        let header = encode_header();
        assert!(validate_header(&header).is_ok());
    }

    #[test]
    fn test_bad_magic_is_corruption() {
        let mut header = encode_header();
        header[0] = b'X';
        assert!(matches!(
            validate_header(&header),
            Err(CacheError::Corruption { .. })
        ));
    }

    #[test]
    fn test_future_version_is_rejected() {
        let mut header = encode_header();
        header[4..].copy_from_slice(&(WAL_FORMAT_VERSION + 1).to_le_bytes());
        assert!(validate_header(&header).is_err());
    }
}
