//! Volume discovery for one storage directory
//!
//! On startup a [`Location`] scans its directory, recognizes volume data
//! files by name, opens each through a [`VolumeFactory`](crate::volume::VolumeFactory),
//! and registers the result by id.
//!
//! # Load sequence
//!
//! 1. Take the location's load lock
//! 2. List the directory once (single producer, bounded queue)
//! 3. Workers classify entries; unrecognized names are skipped
//! 4. Workers skip ids already registered, open the rest with no lock held
//! 5. Register with compare-and-insert; losers of an id race are released
//! 6. Join all workers, log the summary, release the load lock
//!
//! # Invariants
//!
//! - At most one volume per id
//! - Unparseable names never mutate the registry and never abort the scan
//! - One failing volume never aborts the load
//! - An unreadable directory fails the load instead of looking empty

mod errors;
mod identity;
mod options;
mod registry;
mod scanner;

pub use errors::{LocationError, LocationErrorCode, LocationResult};
pub use identity::{classify_os_name, parse_volume_file_name, ClassifyError, VolumeFileName};
pub use options::{CancelToken, LoadOptions, DEFAULT_CONCURRENCY, QUEUE_SLOTS_PER_WORKER};
pub use registry::{LoadReport, Location};
pub use scanner::{LoadFailure, ScanStats};
