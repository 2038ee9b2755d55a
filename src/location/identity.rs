//! Volume file name classification
//!
//! `[<collection>_]<id>.dat` → (id, collection). The collection is split off
//! at the last underscore, so collection names may contain underscores.
//! Pure and total: every name yields a volume file name or a reason to skip.

use std::ffi::OsStr;

use thiserror::Error;

use crate::volume::{ParseVolumeIdError, VolumeId, DATA_FILE_SUFFIX};

const COLLECTION_SEPARATOR: char = '_';

/// A directory entry recognized as a volume data file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeFileName {
    pub id: VolumeId,
    /// Empty for the default collection
    pub collection: String,
}

/// Why a directory entry is not loaded as a volume
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    #[error("not a volume: {0}")]
    NotAVolume(String),

    #[error("invalid volume id in {name}: {source}")]
    InvalidIdentity {
        name: String,
        #[source]
        source: ParseVolumeIdError,
    },
}

/// Classifies a directory entry name.
pub fn parse_volume_file_name(name: &str, is_dir: bool) -> Result<VolumeFileName, ClassifyError> {
    if is_dir {
        return Err(ClassifyError::NotAVolume(name.to_string()));
    }
    let base = name
        .strip_suffix(DATA_FILE_SUFFIX)
        .ok_or_else(|| ClassifyError::NotAVolume(name.to_string()))?;

    // A separator at position 0 does not start a collection: "_5" stays whole.
    let (collection, id_part) = match base.rfind(COLLECTION_SEPARATOR) {
        Some(i) if i > 0 => (&base[..i], &base[i + 1..]),
        _ => ("", base),
    };

    let id = id_part
        .parse::<VolumeId>()
        .map_err(|source| ClassifyError::InvalidIdentity {
            name: name.to_string(),
            source,
        })?;

    Ok(VolumeFileName {
        id,
        collection: collection.to_string(),
    })
}

/// Same as [`parse_volume_file_name`] for raw OS names; non UTF-8 names are
/// never volumes.
pub fn classify_os_name(name: &OsStr, is_dir: bool) -> Result<VolumeFileName, ClassifyError> {
    match name.to_str() {
        Some(name) => parse_volume_file_name(name, is_dir),
        None => Err(ClassifyError::NotAVolume(name.to_string_lossy().into_owned())),
    }
}
