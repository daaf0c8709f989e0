//! Snapshot files
//!
//! ## File Format
//! ```text
//! ┌─────────┬─────────┬──────────────────────────────┐
//! │ CRC (4) │ Len (4) │ bincode(BTreeMap<key,value>) │
//! └─────────┴─────────┴──────────────────────────────┘
//! ```
//! CRC32 covers the data section. Writes go to a temporary file that is
//! renamed over the target.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use super::{MemoryStub, QueryCapability};
use crate::error::{Result, WalletError};

/// CRC (4) + length (4)
pub const SNAPSHOT_HEADER_SIZE: usize = 8;

impl MemoryStub {
    /// Write the whole world state to `path`
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        let data = {
            let map = self.data.read();
            bincode::serialize(&*map)?
        };
        let len = u32::try_from(data.len()).map_err(|_| {
            WalletError::Serialization(format!("snapshot too large: {} bytes", data.len()))
        })?;
        let crc = crc32fast::hash(&data);

        let tmp_path = path.with_extension("tmp");
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&crc.to_be_bytes())?;
            file.write_all(&len.to_be_bytes())?;
            file.write_all(&data)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, path)?;

        tracing::debug!("Saved snapshot of {} bytes to {}", data.len(), path.display());
        Ok(())
    }

    /// Rebuild a store from a snapshot written by [`MemoryStub::save_snapshot`]
    pub fn load_snapshot(path: &Path, capability: QueryCapability) -> Result<Self> {
        let bytes = fs::read(path)?;
        if bytes.len() < SNAPSHOT_HEADER_SIZE {
            return Err(WalletError::SnapshotCorruption(format!(
                "incomplete header: expected {} bytes, got {}",
                SNAPSHOT_HEADER_SIZE,
                bytes.len()
            )));
        }

        let crc = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let len = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
        let data = &bytes[SNAPSHOT_HEADER_SIZE..];

        if data.len() != len {
            return Err(WalletError::SnapshotCorruption(format!(
                "length mismatch: header says {}, file has {}",
                len,
                data.len()
            )));
        }
        if crc32fast::hash(data) != crc {
            return Err(WalletError::SnapshotCorruption("checksum mismatch".to_string()));
        }

        let map: BTreeMap<String, Vec<u8>> = bincode::deserialize(data)?;
        tracing::debug!("Loaded {} keys from {}", map.len(), path.display());

        Ok(Self::from_entries(map, capability))
    }
}
