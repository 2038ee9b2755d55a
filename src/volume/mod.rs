//! Volumes: identity, recovered metadata, and the factory that opens them
//!
//! A volume is an append-only data container persisted as
//! `[<collection>_]<id>.dat` plus an `.idx` companion in the same directory.

mod descriptor;
mod errors;
mod factory;
mod id;
mod superblock;

pub use descriptor::{
    file_stem, ReplicaPlacement, Ttl, TtlUnit, VolumeDescriptor, CURRENT_VERSION,
    SUPPORTED_VERSIONS,
};
pub use errors::{VolumeError, VolumeErrorCode, VolumeResult};
pub use factory::{
    create_volume_file, DiskVolume, DiskVolumeFactory, LoadedVolume, VolumeFactory,
    DATA_FILE_SUFFIX, INDEX_FILE_SUFFIX,
};
pub use id::{ParseVolumeIdError, VolumeId};
pub use superblock::{SuperBlock, SUPERBLOCK_SIZE};
