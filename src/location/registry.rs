//! Location registry
//!
//! Owns the id → volume map of one directory and the two locks around it:
//!
//! - `load_lock`: outer, exclusive; one `load()` at a time per location
//! - `volumes`: inner read/write lock; every read and write of the map
//!
//! Readers always take the inner read lock, so lookups are safe while a
//! rescan is running.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::errors::{LocationError, LocationResult};
use super::options::LoadOptions;
use super::scanner::{scan_directory, LoadFailure, ScanStats, VolumeMap};
use crate::observability::{ObservationScope, Phase};
use crate::volume::{DiskVolumeFactory, LoadedVolume, VolumeDescriptor, VolumeFactory, VolumeId};

/// Summary of one completed load
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub directory: PathBuf,
    /// Volumes registered after the load, including ones from earlier loads
    pub volume_count: usize,
    pub max_volume_count: usize,
    pub stats: ScanStats,
    pub failures: Vec<LoadFailure>,
    pub elapsed_ms: u64,
    pub completed_at: DateTime<Utc>,
}

/// In-memory registry of the volumes stored under one directory
pub struct Location<F: VolumeFactory = DiskVolumeFactory> {
    directory: PathBuf,
    max_volume_count: usize,
    factory: Arc<F>,
    volumes: RwLock<VolumeMap<F::Volume>>,
    load_lock: Mutex<()>,
}

impl Location<DiskVolumeFactory> {
    /// Creates an empty location backed by on-disk volumes
    pub fn new(directory: impl AsRef<Path>, max_volume_count: usize) -> Self {
        Self::with_factory(directory, max_volume_count, Arc::new(DiskVolumeFactory::new()))
    }
}

impl<F: VolumeFactory> Location<F> {
    /// Creates an empty location that opens volumes through `factory`
    pub fn with_factory(
        directory: impl AsRef<Path>,
        max_volume_count: usize,
        factory: Arc<F>,
    ) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            max_volume_count,
            factory,
            volumes: RwLock::new(VolumeMap::new()),
            load_lock: Mutex::new(()),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Capacity policy; not enforced by `load()`
    pub fn max_volume_count(&self) -> usize {
        self.max_volume_count
    }

    /// Scans the directory and registers every volume not yet known.
    ///
    /// Serialized against other loads of this location. Individual files
    /// that fail to open are reported in the returned report and do not fail
    /// the load. Fails when the directory cannot be listed or the load is
    /// cancelled; volumes registered up to that point stay registered.
    pub fn load(&self, options: &LoadOptions) -> LocationResult<LoadReport> {
        let _guard = self
            .load_lock
            .lock()
            .map_err(|_| LocationError::lock_poisoned(&self.directory))?;

        let directory = self.directory.display().to_string();
        let workers = options.worker_count().to_string();
        let scope = ObservationScope::begin(
            Phase::LocationLoad,
            &[("directory", &directory), ("workers", &workers)],
        );

        let outcome = match scan_directory(&self.directory, self.factory.as_ref(), &self.volumes, options) {
            Ok(outcome) => outcome,
            Err(err) => {
                scope.fail(&err.to_string());
                return Err(err);
            }
        };

        let volume_count = self.volume_count();
        if outcome.stats.cancelled {
            let err = LocationError::cancelled(&self.directory, volume_count);
            scope.fail(err.message());
            return Err(err);
        }

        let elapsed_ms = scope.elapsed_ms();
        let stats = &outcome.stats;
        scope.complete(&[
            ("volumes", &volume_count.to_string()),
            ("max", &self.max_volume_count.to_string()),
            ("loaded", &stats.loaded.to_string()),
            ("failed", &stats.failed.to_string()),
            ("skipped", &stats.skipped.to_string()),
            ("duplicates", &stats.duplicates.to_string()),
        ]);

        Ok(LoadReport {
            directory: self.directory.clone(),
            volume_count,
            max_volume_count: self.max_volume_count,
            stats: outcome.stats,
            failures: outcome.failures,
            elapsed_ms,
            completed_at: Utc::now(),
        })
    }

    /// Looks up a registered volume
    pub fn volume(&self, id: VolumeId) -> Option<Arc<F::Volume>> {
        self.read_volumes().get(&id).cloned()
    }

    pub fn has_volume(&self, id: VolumeId) -> bool {
        self.read_volumes().contains_key(&id)
    }

    pub fn volume_count(&self) -> usize {
        self.read_volumes().len()
    }

    /// Registered ids in ascending order
    pub fn volume_ids(&self) -> Vec<VolumeId> {
        let mut ids: Vec<VolumeId> = self.read_volumes().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Descriptors of all registered volumes, ordered by id
    pub fn descriptors(&self) -> Vec<VolumeDescriptor> {
        let mut descriptors: Vec<VolumeDescriptor> = self
            .read_volumes()
            .values()
            .map(|v| v.descriptor().clone())
            .collect();
        descriptors.sort_unstable_by_key(|d| d.id);
        descriptors
    }

    fn read_volumes(&self) -> std::sync::RwLockReadGuard<'_, VolumeMap<F::Volume>> {
        // Locked sections never run foreign code, so a poisoned map is intact.
        self.volumes.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<F: VolumeFactory> std::fmt::Debug for Location<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Location")
            .field("directory", &self.directory)
            .field("max_volume_count", &self.max_volume_count)
            .field("volumes", &self.volume_count())
            .finish()
    }
}
