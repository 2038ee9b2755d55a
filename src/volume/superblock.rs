//! Volume superblock: the fixed header at the start of every `.dat` file
//!
//! Layout (12 bytes, little-endian):
//!
//! | offset | size | field               |
//! |--------|------|---------------------|
//! | 0      | 1    | version             |
//! | 1      | 1    | replica placement   |
//! | 2      | 2    | ttl (count, unit)   |
//! | 4      | 2    | compaction revision |
//! | 6      | 2    | extra size (0)      |
//! | 8      | 4    | CRC32 of bytes 0..8 |

use crc32fast::Hasher;

use super::descriptor::{ReplicaPlacement, Ttl, CURRENT_VERSION, SUPPORTED_VERSIONS};
use super::errors::{VolumeError, VolumeResult};

/// Encoded superblock length
pub const SUPERBLOCK_SIZE: usize = 12;

const CHECKED_LEN: usize = 8;

/// Decoded superblock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperBlock {
    pub version: u8,
    pub replica_placement: ReplicaPlacement,
    pub ttl: Ttl,
    pub compaction_revision: u16,
}

impl Default for SuperBlock {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            replica_placement: ReplicaPlacement::default(),
            ttl: Ttl::default(),
            compaction_revision: 0,
        }
    }
}

impl SuperBlock {
    /// Decodes and validates a superblock.
    ///
    /// Checksum is verified before any field is trusted.
    pub fn decode(bytes: &[u8]) -> VolumeResult<Self> {
        if bytes.len() < SUPERBLOCK_SIZE {
            return Err(VolumeError::corruption(format!(
                "superblock truncated: {} bytes, need {}",
                bytes.len(),
                SUPERBLOCK_SIZE
            )));
        }

        let stored = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        let computed = compute_checksum(&bytes[..CHECKED_LEN]);
        if stored != computed {
            return Err(VolumeError::corruption(format!(
                "superblock checksum mismatch: stored {:#010x}, computed {:#010x}",
                stored, computed
            )));
        }

        let version = bytes[0];
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(VolumeError::unsupported_version(version));
        }

        let extra_size = u16::from_le_bytes([bytes[6], bytes[7]]);
        if extra_size != 0 {
            return Err(VolumeError::corruption(format!(
                "superblock declares {} extra bytes, none supported",
                extra_size
            )));
        }

        Ok(Self {
            version,
            replica_placement: ReplicaPlacement::from_byte(bytes[1]),
            ttl: Ttl::from_bytes([bytes[2], bytes[3]])?,
            compaction_revision: u16::from_le_bytes([bytes[4], bytes[5]]),
        })
    }

    /// Encodes the superblock including its checksum
    pub fn encode(&self) -> VolumeResult<[u8; SUPERBLOCK_SIZE]> {
        let mut out = [0u8; SUPERBLOCK_SIZE];
        out[0] = self.version;
        out[1] = self.replica_placement.to_byte()?;
        out[2..4].copy_from_slice(&self.ttl.to_bytes());
        out[4..6].copy_from_slice(&self.compaction_revision.to_le_bytes());
        // extra size stays zero
        let checksum = compute_checksum(&out[..CHECKED_LEN]);
        out[8..12].copy_from_slice(&checksum.to_le_bytes());
        Ok(out)
    }
}

fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::descriptor::TtlUnit;
    use crate::volume::VolumeErrorCode;

    fn sample() -> SuperBlock {
        SuperBlock {
            version: 2,
            replica_placement: ReplicaPlacement::new(0, 1, 0),
            ttl: Ttl::new(5, TtlUnit::Day),
            compaction_revision: 3,
        }
    }

    #[test]
    fn test_decode_reads_fields() {
        let bytes = sample().encode().unwrap();
        let decoded = SuperBlock::decode(&bytes).unwrap();
        assert_eq!(decoded.version, 2);
        assert_eq!(decoded.replica_placement.to_string(), "010");
        assert_eq!(decoded.ttl.to_string(), "5d");
        assert_eq!(decoded.compaction_revision, 3);
    }

    #[test]
    fn test_truncated_is_corruption() {
        let bytes = sample().encode().unwrap();
        let err = SuperBlock::decode(&bytes[..7]).unwrap_err();
        assert_eq!(err.code(), VolumeErrorCode::VolVolumeCorruption);
    }

    #[test]
    fn test_flipped_bit_fails_checksum() {
        let mut bytes = sample().encode().unwrap();
        bytes[1] ^= 0x01;
        let err = SuperBlock::decode(&bytes).unwrap_err();
        assert_eq!(err.code(), VolumeErrorCode::VolVolumeCorruption);
        assert!(err.message().contains("checksum"));
    }

    #[test]
    fn test_unknown_version_rejected() {
        let block = SuperBlock {
            version: 9,
            ..sample()
        };
        let bytes = block.encode().unwrap();
        let err = SuperBlock::decode(&bytes).unwrap_err();
        assert_eq!(err.code(), VolumeErrorCode::VolVolumeUnsupportedVersion);
    }

    #[test]
    fn test_extra_size_rejected() {
        let mut bytes = sample().encode().unwrap();
        bytes[6] = 4;
        let checksum = compute_checksum(&bytes[..CHECKED_LEN]);
        bytes[8..12].copy_from_slice(&checksum.to_le_bytes());

        let err = SuperBlock::decode(&bytes).unwrap_err();
        assert!(err.message().contains("extra"));
    }
}
