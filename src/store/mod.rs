//! Store: every location served by one storage process
//!
//! Locations are loaded one after another, in configuration order, each with
//! its own worker pool. Lookups search locations in the same order.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::location::{LoadOptions, LoadReport, Location, LocationResult};
use crate::observability::{ObservationScope, Phase};
use crate::volume::{DiskVolumeFactory, VolumeFactory, VolumeId};

/// One configured data directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationConfig {
    pub directory: PathBuf,
    #[serde(default = "default_max_volume_count")]
    pub max_volume_count: usize,
}

fn default_max_volume_count() -> usize {
    7
}

/// Ordered set of locations sharing one volume factory
pub struct Store<F: VolumeFactory = DiskVolumeFactory> {
    locations: Vec<Location<F>>,
}

impl Store<DiskVolumeFactory> {
    /// Creates a store of on-disk locations
    pub fn open(configs: &[LocationConfig]) -> Self {
        Self::with_factory(configs, Arc::new(DiskVolumeFactory::new()))
    }
}

impl<F: VolumeFactory> Store<F> {
    pub fn with_factory(configs: &[LocationConfig], factory: Arc<F>) -> Self {
        let locations = configs
            .iter()
            .map(|c| Location::with_factory(&c.directory, c.max_volume_count, Arc::clone(&factory)))
            .collect();
        Self { locations }
    }

    pub fn locations(&self) -> &[Location<F>] {
        &self.locations
    }

    /// Loads every location in order. Stops at the first location that fails.
    pub fn load_all(&self, options: &LoadOptions) -> LocationResult<Vec<LoadReport>> {
        let count = self.locations.len().to_string();
        let scope = ObservationScope::begin(Phase::StoreLoad, &[("locations", &count)]);

        let mut reports = Vec::with_capacity(self.locations.len());
        for location in &self.locations {
            match location.load(options) {
                Ok(report) => reports.push(report),
                Err(err) => {
                    scope.fail(&err.to_string());
                    return Err(err);
                }
            }
        }

        scope.complete(&[
            ("volumes", &self.volume_count().to_string()),
            ("max", &self.max_volume_count().to_string()),
        ]);
        Ok(reports)
    }

    /// First location holding `id`, with its volume
    pub fn find_volume(&self, id: VolumeId) -> Option<(&Location<F>, Arc<F::Volume>)> {
        self.locations
            .iter()
            .find_map(|location| location.volume(id).map(|v| (location, v)))
    }

    pub fn has_volume(&self, id: VolumeId) -> bool {
        self.locations.iter().any(|l| l.has_volume(id))
    }

    /// Registered volumes across all locations
    pub fn volume_count(&self) -> usize {
        self.locations.iter().map(|l| l.volume_count()).sum()
    }

    /// Sum of the locations' capacity policies
    pub fn max_volume_count(&self) -> usize {
        self.locations.iter().map(|l| l.max_volume_count()).sum()
    }
}
