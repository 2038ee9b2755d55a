//! Volume identity

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Numeric identity of a volume within one location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VolumeId(u32);

impl VolumeId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for VolumeId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for VolumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a string is not a volume id
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseVolumeIdError {
    #[error("empty volume id")]
    Empty,

    #[error("volume id '{0}' is not a base-10 number")]
    NotNumeric(String),

    #[error("volume id '{0}' is out of range")]
    OutOfRange(String),
}

impl FromStr for VolumeId {
    type Err = ParseVolumeIdError;

    /// Accepts ASCII digits only; signs and whitespace are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseVolumeIdError::Empty);
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseVolumeIdError::NotNumeric(s.to_string()));
        }
        s.parse::<u32>()
            .map(VolumeId)
            .map_err(|_| ParseVolumeIdError::OutOfRange(s.to_string()))
    }
}
