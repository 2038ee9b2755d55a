//! Load options: worker count, queue sizing, cancellation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Default worker count when concurrent loading is enabled
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Work queue slots per worker
pub const QUEUE_SLOTS_PER_WORKER: usize = 10;

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// How a location load is executed
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// When false, a single worker loads entries one at a time
    pub concurrent: bool,
    /// Worker count when `concurrent` is set; 0 is treated as 1
    pub concurrency: usize,
    /// Optional cancellation flag checked between entries
    pub cancel: Option<CancelToken>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            concurrent: true,
            concurrency: DEFAULT_CONCURRENCY,
            cancel: None,
        }
    }
}

impl LoadOptions {
    /// Strict sequential loading with one worker
    pub fn sequential() -> Self {
        Self {
            concurrent: false,
            ..Self::default()
        }
    }

    /// Concurrent loading with `workers` workers
    pub fn with_concurrency(workers: usize) -> Self {
        Self {
            concurrent: true,
            concurrency: workers,
            cancel: None,
        }
    }

    /// Attaches a cancellation token
    pub fn cancellable(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Number of workers the scanner starts; always at least 1
    pub fn worker_count(&self) -> usize {
        if self.concurrent {
            self.concurrency.max(1)
        } else {
            1
        }
    }

    /// Bounded queue capacity between the producer and the workers
    pub fn queue_capacity(&self) -> usize {
        self.worker_count() * QUEUE_SLOTS_PER_WORKER
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.is_cancelled())
    }
}
