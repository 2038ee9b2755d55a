//! Location error types
//!
//! Error codes:
//! - VOL_LOCATION_DIRECTORY_UNREADABLE (ERROR)
//! - VOL_LOCATION_LOAD_CANCELLED (ERROR)
//! - VOL_LOCATION_LOCK_POISONED (ERROR)
//!
//! Per-file failures are not location errors: they are reported in the load
//! report and the scan continues. Only the conditions above fail `load()`.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Location-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationErrorCode {
    /// The directory could not be listed
    VolLocationDirectoryUnreadable,
    /// The caller cancelled the load
    VolLocationLoadCancelled,
    /// A previous load panicked while holding the load lock
    VolLocationLockPoisoned,
}

impl LocationErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            LocationErrorCode::VolLocationDirectoryUnreadable => "VOL_LOCATION_DIRECTORY_UNREADABLE",
            LocationErrorCode::VolLocationLoadCancelled => "VOL_LOCATION_LOAD_CANCELLED",
            LocationErrorCode::VolLocationLockPoisoned => "VOL_LOCATION_LOCK_POISONED",
        }
    }
}

impl fmt::Display for LocationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Location error with the directory it concerns
#[derive(Debug)]
pub struct LocationError {
    code: LocationErrorCode,
    directory: PathBuf,
    message: String,
    /// Volumes registered when the load stopped, if it got that far
    volumes_loaded: Option<usize>,
    source: Option<io::Error>,
}

impl LocationError {
    /// Listing the directory failed, either on open or mid-iteration
    pub fn directory_unreadable(directory: &Path, source: io::Error) -> Self {
        Self {
            code: LocationErrorCode::VolLocationDirectoryUnreadable,
            directory: directory.to_path_buf(),
            message: format!("Cannot list volume directory {}", directory.display()),
            volumes_loaded: None,
            source: Some(source),
        }
    }

    /// The load was cancelled with `volumes_loaded` volumes registered
    pub fn cancelled(directory: &Path, volumes_loaded: usize) -> Self {
        Self {
            code: LocationErrorCode::VolLocationLoadCancelled,
            directory: directory.to_path_buf(),
            message: format!(
                "Load of {} cancelled with {} volumes registered",
                directory.display(),
                volumes_loaded
            ),
            volumes_loaded: Some(volumes_loaded),
            source: None,
        }
    }

    pub fn lock_poisoned(directory: &Path) -> Self {
        Self {
            code: LocationErrorCode::VolLocationLockPoisoned,
            directory: directory.to_path_buf(),
            message: format!("Load lock poisoned for {}", directory.display()),
            volumes_loaded: None,
            source: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> LocationErrorCode {
        self.code
    }

    /// Returns the directory the error concerns
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns how many volumes were registered when a cancelled load stopped
    pub fn volumes_loaded(&self) -> Option<usize> {
        self.volumes_loaded
    }
}

impl fmt::Display for LocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ERROR] {}: {}", self.code, self.message)?;
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for LocationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for location operations
pub type LocationResult<T> = Result<T, LocationError>;
