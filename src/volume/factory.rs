//! Volume factory: turns (directory, collection, id) into a loaded volume
//!
//! The registry only depends on the [`VolumeFactory`] trait. The
//! [`DiskVolumeFactory`] implementation opens the `.dat` data file, validates
//! its superblock, and opens (or creates) the `.idx` companion.
//!
//! # Fail-clean contract
//!
//! A factory that returns `Err` leaves nothing open and nothing registered.
//! Every handle acquired during a failed open is dropped before returning.

use std::fs::{self, File, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};

use super::descriptor::{file_stem, VolumeDescriptor};
use super::errors::{VolumeError, VolumeResult};
use super::id::VolumeId;
use super::superblock::{SuperBlock, SUPERBLOCK_SIZE};

/// Data file suffix
pub const DATA_FILE_SUFFIX: &str = ".dat";

/// Index file suffix
pub const INDEX_FILE_SUFFIX: &str = ".idx";

/// A volume the registry can hold
pub trait LoadedVolume: Send + Sync + 'static {
    /// Metadata recovered when the volume was opened
    fn descriptor(&self) -> &VolumeDescriptor;
}

impl LoadedVolume for VolumeDescriptor {
    fn descriptor(&self) -> &VolumeDescriptor {
        self
    }
}

/// Opens volumes on behalf of a location
pub trait VolumeFactory: Send + Sync {
    type Volume: LoadedVolume;

    /// Opens and validates one volume. Must be fail-clean.
    fn open_volume(
        &self,
        directory: &Path,
        collection: &str,
        id: VolumeId,
    ) -> VolumeResult<Self::Volume>;

    /// Disposes of a successfully opened volume the registry did not keep.
    fn release_volume(&self, volume: Self::Volume) {
        drop(volume);
    }
}

/// A volume opened from disk. Holds its data and index files open.
#[derive(Debug)]
pub struct DiskVolume {
    descriptor: VolumeDescriptor,
    data_path: PathBuf,
    index_path: PathBuf,
    data_file: File,
    index_file: File,
}

impl DiskVolume {
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    pub fn data_file(&self) -> &File {
        &self.data_file
    }

    pub fn index_file(&self) -> &File {
        &self.index_file
    }
}

impl LoadedVolume for DiskVolume {
    fn descriptor(&self) -> &VolumeDescriptor {
        &self.descriptor
    }
}

/// Opens `.dat`/`.idx` pairs directly from the filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskVolumeFactory;

impl DiskVolumeFactory {
    pub fn new() -> Self {
        Self
    }
}

impl VolumeFactory for DiskVolumeFactory {
    type Volume = DiskVolume;

    fn open_volume(
        &self,
        directory: &Path,
        collection: &str,
        id: VolumeId,
    ) -> VolumeResult<DiskVolume> {
        let stem = file_stem(collection, id);
        let data_path = directory.join(format!("{}{}", stem, DATA_FILE_SUFFIX));
        let index_path = directory.join(format!("{}{}", stem, INDEX_FILE_SUFFIX));

        let data_file = File::open(&data_path).map_err(|e| VolumeError::io_error(&data_path, e))?;
        let size = data_file
            .metadata()
            .map_err(|e| VolumeError::io_error(&data_path, e))?
            .len();

        let mut header = Vec::with_capacity(SUPERBLOCK_SIZE);
        (&data_file)
            .take(SUPERBLOCK_SIZE as u64)
            .read_to_end(&mut header)
            .map_err(|e| VolumeError::io_error(&data_path, e))?;
        let superblock = SuperBlock::decode(&header).map_err(|e| e.at_path(&data_path))?;

        let index_file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&index_path)
            .map_err(|e| VolumeError::io_error(&index_path, e))?;

        Ok(DiskVolume {
            descriptor: VolumeDescriptor {
                id,
                collection: collection.to_string(),
                replica_placement: superblock.replica_placement,
                version: superblock.version,
                size,
                ttl: superblock.ttl,
                compaction_revision: superblock.compaction_revision,
            },
            data_path,
            index_path,
            data_file,
            index_file,
        })
    }
}

/// Writes a new data file holding only `superblock`. Returns its path.
///
/// Existing files with the same name are truncated.
pub fn create_volume_file(
    directory: &Path,
    collection: &str,
    id: VolumeId,
    superblock: &SuperBlock,
) -> VolumeResult<PathBuf> {
    let path = directory.join(format!("{}{}", file_stem(collection, id), DATA_FILE_SUFFIX));
    let bytes = superblock.encode()?;
    fs::write(&path, bytes).map_err(|e| VolumeError::io_error(&path, e))?;
    Ok(path)
}
