//! Concurrent directory scanner
//!
//! One producer lists the directory once and feeds a bounded queue; `W`
//! workers drain it, classify each entry, open recognized volumes through the
//! factory, and register them with compare-and-insert.
//!
//! ```text
//!   read_dir ──► producer ──► bounded(10·W) ──► worker 1..W ──► factory
//!                                                   │
//!                                                   ▼
//!                                  RwLock<HashMap<VolumeId, Arc<V>>>
//! ```
//!
//! # Guarantees
//!
//! - At most `W` factory calls in flight (one per worker)
//! - Every listed entry is handled at most once; exactly once unless cancelled
//! - The factory is called with no lock held
//! - Two workers racing on one id: the first insert wins, the loser is
//!   handed back to the factory's `release_volume`
//! - No ordering between entries

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::{self, DirEntry, ReadDir};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread;

use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;

use super::errors::{LocationError, LocationResult};
use super::identity::classify_os_name;
use super::options::LoadOptions;
use crate::observability::{log_event, log_event_at, Event, Logger, Severity};
use crate::volume::{LoadedVolume, VolumeFactory, VolumeId};

/// Registered volumes of one location
pub type VolumeMap<V> = HashMap<VolumeId, Arc<V>>;

/// Per-load counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Directory entries handed to workers
    pub entries: u64,
    /// Volumes opened and registered by this load
    pub loaded: u64,
    /// Entries that are not volume files or carry an invalid id
    pub skipped: u64,
    /// Volume files whose id was already registered
    pub already_loaded: u64,
    /// Volume files the factory could not open
    pub failed: u64,
    /// Volumes opened but released because another file won the id
    pub duplicates: u64,
    /// Whether a cancellation request stopped the load before every entry
    /// was handled
    pub cancelled: bool,
}

impl ScanStats {
    /// Entries that reached a final outcome
    pub fn handled(&self) -> u64 {
        self.loaded + self.skipped + self.already_loaded + self.failed + self.duplicates
    }
}

/// A recognized volume file the factory failed to open
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadFailure {
    pub file_name: String,
    pub volume_id: VolumeId,
    pub code: String,
    pub message: String,
}

/// Result of one scan pass
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub stats: ScanStats,
    pub failures: Vec<LoadFailure>,
}

#[derive(Default)]
struct ScanCounters {
    loaded: AtomicU64,
    skipped: AtomicU64,
    already_loaded: AtomicU64,
    failed: AtomicU64,
    duplicates: AtomicU64,
    /// Set by a worker that saw the cancel flag and left entries behind
    stopped_early: AtomicBool,
    failures: Mutex<Vec<LoadFailure>>,
}

impl ScanCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn into_outcome(self, entries: u64, producer_stopped_early: bool) -> ScanOutcome {
        let cancelled = producer_stopped_early || self.stopped_early.into_inner();
        let mut failures = self
            .failures
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        failures.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        ScanOutcome {
            stats: ScanStats {
                entries,
                loaded: self.loaded.into_inner(),
                skipped: self.skipped.into_inner(),
                already_loaded: self.already_loaded.into_inner(),
                failed: self.failed.into_inner(),
                duplicates: self.duplicates.into_inner(),
                cancelled,
            },
            failures,
        }
    }
}

/// Scans `directory` and registers every volume found into `volumes`.
///
/// Fails only when the directory cannot be listed. Volumes registered before
/// a mid-listing failure stay registered.
pub fn scan_directory<F: VolumeFactory>(
    directory: &Path,
    factory: &F,
    volumes: &RwLock<VolumeMap<F::Volume>>,
    options: &LoadOptions,
) -> LocationResult<ScanOutcome> {
    let entries =
        fs::read_dir(directory).map_err(|e| LocationError::directory_unreadable(directory, e))?;

    let (tx, rx) = crossbeam_channel::bounded::<DirEntry>(options.queue_capacity());
    let worker = Worker {
        directory,
        factory,
        volumes,
        options,
        counters: ScanCounters::default(),
    };

    let produced = thread::scope(|scope| {
        let producer = scope.spawn(move || produce(directory, entries, tx, options));

        for _ in 0..options.worker_count() {
            let rx = rx.clone();
            let worker = &worker;
            scope.spawn(move || worker.run(rx));
        }
        // Workers hold the only receivers now; if they all exit, sends fail.
        drop(rx);

        producer
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
    });

    let produced = produced?;
    Ok(worker
        .counters
        .into_outcome(produced.sent, produced.cancelled))
}

/// What the producer handed to the workers
struct Produced {
    sent: u64,
    /// Listing stopped on the cancel flag with entries left unread
    cancelled: bool,
}

fn produce(
    directory: &Path,
    entries: ReadDir,
    tx: Sender<DirEntry>,
    options: &LoadOptions,
) -> LocationResult<Produced> {
    let mut sent = 0;
    for entry in entries {
        if options.is_cancelled() {
            return Ok(Produced {
                sent,
                cancelled: true,
            });
        }
        let entry = entry.map_err(|e| LocationError::directory_unreadable(directory, e))?;
        // Fails only once every worker has stopped early.
        if tx.send(entry).is_err() {
            break;
        }
        sent += 1;
    }
    Ok(Produced {
        sent,
        cancelled: false,
    })
}

struct Worker<'a, F: VolumeFactory> {
    directory: &'a Path,
    factory: &'a F,
    volumes: &'a RwLock<VolumeMap<F::Volume>>,
    options: &'a LoadOptions,
    counters: ScanCounters,
}

impl<F: VolumeFactory> Worker<'_, F> {
    fn run(&self, rx: Receiver<DirEntry>) {
        for entry in rx.iter() {
            if self.options.is_cancelled() {
                self.counters.stopped_early.store(true, Ordering::Relaxed);
                break;
            }
            self.load_entry(&entry);
        }
    }

    fn load_entry(&self, entry: &DirEntry) {
        let name = entry.file_name();
        // file_type does not follow symlinks. An entry of unknown type is
        // treated like a directory and skipped.
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(true);

        let file = match classify_os_name(&name, is_dir) {
            Ok(file) => file,
            Err(reason) => {
                ScanCounters::bump(&self.counters.skipped);
                if Logger::enabled(Severity::Trace) {
                    log_event_at(
                        Severity::Trace,
                        Event::EntrySkipped,
                        &[
                            ("file", &name.to_string_lossy()),
                            ("reason", &reason.to_string()),
                        ],
                    );
                }
                return;
            }
        };

        if self.is_registered(file.id) {
            ScanCounters::bump(&self.counters.already_loaded);
            return;
        }

        let path = self.directory.join(&name);
        let path = path.display().to_string();
        match self
            .factory
            .open_volume(self.directory, &file.collection, file.id)
        {
            Ok(volume) => self.register(file.id, &path, volume),
            Err(err) => {
                ScanCounters::bump(&self.counters.failed);
                log_event_at(
                    Severity::Warn,
                    Event::VolumeLoadFailed,
                    &[
                        ("file", &path),
                        ("volume_id", &file.id.to_string()),
                        ("error", &err.to_string()),
                    ],
                );
                self.counters
                    .failures
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(LoadFailure {
                        file_name: name.to_string_lossy().into_owned(),
                        volume_id: file.id,
                        code: err.code().code().to_string(),
                        message: err.message().to_string(),
                    });
            }
        }
    }

    fn is_registered(&self, id: VolumeId) -> bool {
        // Locked sections never run foreign code, so a poisoned map is intact.
        self.volumes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    /// Compare-and-insert; the presence check above is only a shortcut.
    fn register(&self, id: VolumeId, path: &str, volume: F::Volume) {
        let inserted = {
            let mut map = self.volumes.write().unwrap_or_else(PoisonError::into_inner);
            match map.entry(id) {
                Entry::Vacant(slot) => {
                    let volume = Arc::new(volume);
                    slot.insert(Arc::clone(&volume));
                    Ok(volume)
                }
                Entry::Occupied(_) => Err(volume),
            }
        };

        match inserted {
            Ok(volume) => {
                ScanCounters::bump(&self.counters.loaded);
                let d = volume.descriptor();
                log_event(
                    Event::VolumeLoaded,
                    &[
                        ("file", path),
                        ("volume_id", &id.to_string()),
                        ("collection", &d.collection),
                        ("replica_placement", &d.replica_placement.to_string()),
                        ("version", &d.version.to_string()),
                        ("size", &d.size.to_string()),
                        ("ttl", &d.ttl.to_string()),
                    ],
                );
            }
            Err(volume) => {
                ScanCounters::bump(&self.counters.duplicates);
                log_event_at(
                    Severity::Warn,
                    Event::VolumeDuplicateDiscarded,
                    &[("file", path), ("volume_id", &id.to_string())],
                );
                self.factory.release_volume(volume);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::{VolumeDescriptor, VolumeError, VolumeResult};
    use crate::location::CancelToken;
    use std::fs;
    use tempfile::TempDir;

    struct StubFactory;

    impl VolumeFactory for StubFactory {
        type Volume = VolumeDescriptor;

        fn open_volume(
            &self,
            _directory: &Path,
            collection: &str,
            id: VolumeId,
        ) -> VolumeResult<VolumeDescriptor> {
            if collection == "broken" {
                return Err(VolumeError::corruption("stub corruption"));
            }
            Ok(VolumeDescriptor {
                id,
                collection: collection.to_string(),
                replica_placement: Default::default(),
                version: 3,
                size: 0,
                ttl: Default::default(),
                compaction_revision: 0,
            })
        }
    }

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_scan_counts_every_entry_once() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "1.dat");
        touch(dir.path(), "a_2.dat");
        touch(dir.path(), "broken_3.dat");
        touch(dir.path(), "notes.txt");
        fs::create_dir(dir.path().join("sub")).unwrap();

        let volumes = RwLock::new(VolumeMap::new());
        let outcome =
            scan_directory(dir.path(), &StubFactory, &volumes, &LoadOptions::default()).unwrap();

        let stats = &outcome.stats;
        assert_eq!(stats.entries, 5);
        assert_eq!(stats.loaded, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.handled(), stats.entries);
        assert!(!stats.cancelled);

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].file_name, "broken_3.dat");
        assert_eq!(outcome.failures[0].code, "VOL_VOLUME_CORRUPTION");
        assert_eq!(volumes.read().unwrap().len(), 2);
    }

    #[test]
    fn test_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let volumes = RwLock::new(VolumeMap::<VolumeDescriptor>::new());

        let err = scan_directory(&missing, &StubFactory, &volumes, &LoadOptions::default())
            .unwrap_err();
        assert_eq!(
            err.code(),
            crate::location::LocationErrorCode::VolLocationDirectoryUnreadable
        );
    }

    #[test]
    fn test_cancel_with_nothing_left_is_not_a_cancelled_scan() {
        let dir = TempDir::new().unwrap();
        let token = CancelToken::new();
        token.cancel();

        let volumes = RwLock::new(VolumeMap::<VolumeDescriptor>::new());
        let options = LoadOptions::default().cancellable(token);
        let outcome = scan_directory(dir.path(), &StubFactory, &volumes, &options).unwrap();

        assert_eq!(outcome.stats.entries, 0);
        assert!(!outcome.stats.cancelled);
    }

    #[test]
    fn test_cancel_before_listing_stops_the_scan() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "1.dat");
        let token = CancelToken::new();
        token.cancel();

        let volumes = RwLock::new(VolumeMap::new());
        let options = LoadOptions::sequential().cancellable(token);
        let outcome = scan_directory(dir.path(), &StubFactory, &volumes, &options).unwrap();

        assert_eq!(outcome.stats.entries, 0);
        assert!(outcome.stats.cancelled);
        assert!(volumes.read().unwrap().is_empty());
    }

    #[test]
    fn test_more_entries_than_queue_capacity() {
        let dir = TempDir::new().unwrap();
        for i in 0..250 {
            touch(dir.path(), &format!("{}.dat", i));
        }

        let volumes = RwLock::new(VolumeMap::new());
        let outcome = scan_directory(
            dir.path(),
            &StubFactory,
            &volumes,
            &LoadOptions::with_concurrency(2),
        )
        .unwrap();

        assert_eq!(outcome.stats.entries, 250);
        assert_eq!(outcome.stats.loaded, 250);
        assert_eq!(volumes.read().unwrap().len(), 250);
    }
}
