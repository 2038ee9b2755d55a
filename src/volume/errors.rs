//! Volume error types
//!
//! Error codes:
//! - VOL_VOLUME_IO_ERROR (ERROR)
//! - VOL_VOLUME_NOT_FOUND (ERROR)
//! - VOL_VOLUME_CORRUPTION (ERROR)
//! - VOL_VOLUME_UNSUPPORTED_VERSION (ERROR)
//!
//! A volume error only ever fails the one volume it names. The scan that
//! triggered it keeps going.

use std::fmt;
use std::io;
use std::path::Path;

/// Volume-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeErrorCode {
    /// Opening or reading a volume file failed
    VolVolumeIoError,
    /// The data file does not exist
    VolVolumeNotFound,
    /// Superblock is truncated, fails its checksum, or holds invalid fields
    VolVolumeCorruption,
    /// Superblock version is not one this build can read
    VolVolumeUnsupportedVersion,
}

impl VolumeErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            VolumeErrorCode::VolVolumeIoError => "VOL_VOLUME_IO_ERROR",
            VolumeErrorCode::VolVolumeNotFound => "VOL_VOLUME_NOT_FOUND",
            VolumeErrorCode::VolVolumeCorruption => "VOL_VOLUME_CORRUPTION",
            VolumeErrorCode::VolVolumeUnsupportedVersion => "VOL_VOLUME_UNSUPPORTED_VERSION",
        }
    }
}

impl fmt::Display for VolumeErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Volume error with context
#[derive(Debug)]
pub struct VolumeError {
    code: VolumeErrorCode,
    message: String,
    source: Option<io::Error>,
}

impl VolumeError {
    /// Create an I/O error for `path`
    pub fn io_error(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            return Self {
                code: VolumeErrorCode::VolVolumeNotFound,
                message: format!("Volume file not found: {}", path.display()),
                source: Some(source),
            };
        }
        Self {
            code: VolumeErrorCode::VolVolumeIoError,
            message: format!("I/O error on {}", path.display()),
            source: Some(source),
        }
    }

    /// Create a corruption error
    pub fn corruption(reason: impl Into<String>) -> Self {
        Self {
            code: VolumeErrorCode::VolVolumeCorruption,
            message: reason.into(),
            source: None,
        }
    }

    /// Create an unsupported version error
    pub fn unsupported_version(version: u8) -> Self {
        Self {
            code: VolumeErrorCode::VolVolumeUnsupportedVersion,
            message: format!("Unsupported volume version {}", version),
            source: None,
        }
    }

    /// Prefixes the message with the file it concerns
    pub fn at_path(mut self, path: &Path) -> Self {
        self.message = format!("{}: {}", path.display(), self.message);
        self
    }

    /// Returns the error code
    pub fn code(&self) -> VolumeErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for VolumeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ERROR] {}: {}", self.code, self.message)?;
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for VolumeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for volume operations
pub type VolumeResult<T> = Result<T, VolumeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_not_found_maps_to_own_code() {
        let path = PathBuf::from("/data/7.dat");
        let err = VolumeError::io_error(&path, io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(err.code(), VolumeErrorCode::VolVolumeNotFound);

        let err = VolumeError::io_error(&path, io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(err.code(), VolumeErrorCode::VolVolumeIoError);
    }

    #[test]
    fn test_error_display() {
        let err = VolumeError::corruption("superblock checksum mismatch");
        let display = err.to_string();
        assert!(display.contains("VOL_VOLUME_CORRUPTION"));
        assert!(display.contains("checksum"));

        let err = VolumeError::unsupported_version(9);
        assert!(err.to_string().contains("version 9"));
    }
}
