//! Shared fixtures for location tests
//!
//! - `RecordingFactory`: in-memory volume factory that counts calls,
//!   tracks in-flight opens, and can fail or block chosen volumes
//! - helpers to lay out volume directories

#![allow(dead_code)]

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

use bitstore::location::CancelToken;
use bitstore::volume::{
    create_volume_file, LoadedVolume, SuperBlock, VolumeDescriptor, VolumeError, VolumeFactory,
    VolumeId, VolumeResult,
};

/// A volume handed out by `RecordingFactory`; counts its own drops.
pub struct TrackedVolume {
    descriptor: VolumeDescriptor,
    drops: Arc<AtomicUsize>,
}

impl LoadedVolume for TrackedVolume {
    fn descriptor(&self) -> &VolumeDescriptor {
        &self.descriptor
    }
}

impl Drop for TrackedVolume {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct RecordingFactory {
    pub opens: AtomicUsize,
    pub releases: AtomicUsize,
    pub drops: Arc<AtomicUsize>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub opened_files: Mutex<Vec<(String, u32)>>,
    fail_collections: HashSet<String>,
    delay: Option<Duration>,
    rendezvous: Option<(u32, Arc<Barrier>)>,
    cancel_on_first_open: Option<CancelToken>,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every open sleeps for `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Opens of volumes in `collection` fail
    pub fn failing(mut self, collection: &str) -> Self {
        self.fail_collections.insert(collection.to_string());
        self
    }

    /// Opens of `id` wait until `parties` opens of it are in progress
    pub fn rendezvous_on(mut self, id: u32, parties: usize) -> Self {
        self.rendezvous = Some((id, Arc::new(Barrier::new(parties))));
        self
    }

    /// The first open cancels `token`
    pub fn cancelling(mut self, token: CancelToken) -> Self {
        self.cancel_on_first_open = Some(token);
        self
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn drops(&self) -> usize {
        self.drops.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl VolumeFactory for RecordingFactory {
    type Volume = TrackedVolume;

    fn open_volume(
        &self,
        _directory: &Path,
        collection: &str,
        id: VolumeId,
    ) -> VolumeResult<TrackedVolume> {
        let previous_opens = self.opens.fetch_add(1, Ordering::SeqCst);
        if previous_opens == 0 {
            if let Some(token) = &self.cancel_on_first_open {
                token.cancel();
            }
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.opened_files
            .lock()
            .unwrap()
            .push((collection.to_string(), id.get()));

        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        if let Some((rendezvous_id, barrier)) = &self.rendezvous {
            if *rendezvous_id == id.get() {
                barrier.wait();
            }
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_collections.contains(collection) {
            return Err(VolumeError::corruption(format!(
                "{}_{} is damaged",
                collection, id
            )));
        }

        Ok(TrackedVolume {
            descriptor: VolumeDescriptor {
                id,
                collection: collection.to_string(),
                replica_placement: Default::default(),
                version: 3,
                size: 0,
                ttl: Default::default(),
                compaction_revision: 0,
            },
            drops: Arc::clone(&self.drops),
        })
    }

    fn release_volume(&self, volume: TrackedVolume) {
        self.releases.fetch_add(1, Ordering::SeqCst);
        drop(volume);
    }
}

/// Creates empty files; the recording factory never reads them
pub fn touch_all(dir: &Path, names: &[&str]) {
    for name in names {
        fs::write(dir.join(name), b"").unwrap();
    }
}

/// Creates `count` empty `<n>.dat` files numbered from 1
pub fn touch_numbered(dir: &Path, count: u32) {
    for id in 1..=count {
        fs::write(dir.join(format!("{}.dat", id)), b"").unwrap();
    }
}

/// Writes real volume files readable by the disk factory
pub fn create_disk_volumes(dir: &Path, volumes: &[(&str, u32)]) {
    for (collection, id) in volumes {
        create_volume_file(dir, collection, VolumeId::new(*id), &SuperBlock::default()).unwrap();
    }
}
