//! Recovered volume metadata
//!
//! A descriptor is pure data: it is produced by a volume factory and shared
//! read-only by the registry.

use std::fmt;

use serde::{Serialize, Serializer};

use super::errors::{VolumeError, VolumeResult};
use super::id::VolumeId;

/// On-disk format versions this build can read
pub const SUPPORTED_VERSIONS: [u8; 3] = [1, 2, 3];

/// Current format version written by `SuperBlock::default`
pub const CURRENT_VERSION: u8 = 3;

/// Replica placement policy, stored as one byte read as three decimal digits:
/// copies in other data centers, other racks, and the same rack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplicaPlacement {
    pub diff_data_center: u8,
    pub diff_rack: u8,
    pub same_rack: u8,
}

impl ReplicaPlacement {
    pub fn new(diff_data_center: u8, diff_rack: u8, same_rack: u8) -> Self {
        Self {
            diff_data_center,
            diff_rack,
            same_rack,
        }
    }

    /// Every byte decodes; 255 reads as "255".
    pub fn from_byte(b: u8) -> Self {
        Self {
            diff_data_center: b / 100,
            diff_rack: (b / 10) % 10,
            same_rack: b % 10,
        }
    }

    /// Encodes back to one byte. Fails when a digit is above 9 or the
    /// three-digit value does not fit in a byte.
    pub fn to_byte(self) -> VolumeResult<u8> {
        if self.diff_rack > 9 || self.same_rack > 9 {
            return Err(VolumeError::corruption(format!(
                "replica placement {} has a digit above 9",
                self
            )));
        }
        let value = self.diff_data_center as u16 * 100 + self.diff_rack as u16 * 10 + self.same_rack as u16;
        u8::try_from(value).map_err(|_| {
            VolumeError::corruption(format!("replica placement {} does not fit in a byte", value))
        })
    }

    /// Total number of copies including the original
    pub fn copy_count(&self) -> u32 {
        self.diff_data_center as u32 + self.diff_rack as u32 + self.same_rack as u32 + 1
    }
}

impl fmt::Display for ReplicaPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.diff_data_center, self.diff_rack, self.same_rack)
    }
}

impl Serialize for ReplicaPlacement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Unit of a time-to-live policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TtlUnit {
    #[default]
    Empty,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl TtlUnit {
    fn from_byte(b: u8) -> VolumeResult<Self> {
        Ok(match b {
            0 => TtlUnit::Empty,
            1 => TtlUnit::Minute,
            2 => TtlUnit::Hour,
            3 => TtlUnit::Day,
            4 => TtlUnit::Week,
            5 => TtlUnit::Month,
            6 => TtlUnit::Year,
            other => {
                return Err(VolumeError::corruption(format!(
                    "unknown ttl unit byte {}",
                    other
                )))
            }
        })
    }

    fn to_byte(self) -> u8 {
        match self {
            TtlUnit::Empty => 0,
            TtlUnit::Minute => 1,
            TtlUnit::Hour => 2,
            TtlUnit::Day => 3,
            TtlUnit::Week => 4,
            TtlUnit::Month => 5,
            TtlUnit::Year => 6,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            TtlUnit::Empty => "",
            TtlUnit::Minute => "m",
            TtlUnit::Hour => "h",
            TtlUnit::Day => "d",
            TtlUnit::Week => "w",
            TtlUnit::Month => "M",
            TtlUnit::Year => "y",
        }
    }

    fn minutes(self) -> u32 {
        match self {
            TtlUnit::Empty => 0,
            TtlUnit::Minute => 1,
            TtlUnit::Hour => 60,
            TtlUnit::Day => 60 * 24,
            TtlUnit::Week => 60 * 24 * 7,
            TtlUnit::Month => 60 * 24 * 31,
            TtlUnit::Year => 60 * 24 * 365,
        }
    }
}

/// Time-to-live policy: `count` units; empty means "never expires"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ttl {
    pub count: u8,
    pub unit: TtlUnit,
}

impl Ttl {
    pub fn new(count: u8, unit: TtlUnit) -> Self {
        Self { count, unit }
    }

    pub fn from_bytes(bytes: [u8; 2]) -> VolumeResult<Self> {
        Ok(Self {
            count: bytes[0],
            unit: TtlUnit::from_byte(bytes[1])?,
        })
    }

    pub fn to_bytes(self) -> [u8; 2] {
        [self.count, self.unit.to_byte()]
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0 || self.unit == TtlUnit::Empty
    }

    /// Policy length in minutes; 0 when empty
    pub fn minutes(&self) -> u32 {
        if self.is_empty() {
            return 0;
        }
        self.count as u32 * self.unit.minutes()
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        write!(f, "{}{}", self.count, self.unit.suffix())
    }
}

impl Serialize for Ttl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Everything the registry knows about one loaded volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeDescriptor {
    pub id: VolumeId,
    pub collection: String,
    pub replica_placement: ReplicaPlacement,
    pub version: u8,
    /// Data file length in bytes at load time
    pub size: u64,
    pub ttl: Ttl,
    pub compaction_revision: u16,
}

impl VolumeDescriptor {
    /// File stem shared by the data and index files: `<collection>_<id>` or `<id>`
    pub fn file_stem(&self) -> String {
        file_stem(&self.collection, self.id)
    }
}

/// File stem for a volume: `<collection>_<id>`, or `<id>` for the default collection
pub fn file_stem(collection: &str, id: VolumeId) -> String {
    if collection.is_empty() {
        id.to_string()
    } else {
        format!("{}_{}", collection, id)
    }
}
