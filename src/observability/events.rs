//! Observable events for volume discovery
//!
//! Events are explicit and typed; the string form is what appears in the
//! `event` field of a log line.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration file loaded and validated
    ConfigLoaded,

    // Store lifecycle
    /// Store begins loading all locations
    StoreLoadBegin,
    /// Every location of the store has been loaded
    StoreLoadComplete,
    /// Store load stopped at a failed location
    StoreLoadFailed,

    // Location scan
    /// Location load begins
    LocationLoadBegin,
    /// Location load finished; carries the summary
    LocationLoadComplete,
    /// Location load failed (directory unreadable, cancelled)
    LocationLoadFailed,

    // Per entry
    /// Directory entry skipped by the identity parser
    EntrySkipped,
    /// Volume recovered and registered
    VolumeLoaded,
    /// Volume factory failed for a recognized file
    VolumeLoadFailed,
    /// A second volume for an already registered id was released
    VolumeDuplicateDiscarded,
}

impl Event {
    /// Returns the event name
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::StoreLoadBegin => "STORE_LOAD_BEGIN",
            Event::StoreLoadComplete => "STORE_LOAD_COMPLETE",
            Event::StoreLoadFailed => "STORE_LOAD_FAILED",
            Event::LocationLoadBegin => "LOCATION_LOAD_BEGIN",
            Event::LocationLoadComplete => "LOCATION_LOAD_COMPLETE",
            Event::LocationLoadFailed => "LOCATION_LOAD_FAILED",
            Event::EntrySkipped => "ENTRY_SKIPPED",
            Event::VolumeLoaded => "VOLUME_LOADED",
            Event::VolumeLoadFailed => "VOLUME_LOAD_FAILED",
            Event::VolumeDuplicateDiscarded => "VOLUME_DUPLICATE_DISCARDED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
