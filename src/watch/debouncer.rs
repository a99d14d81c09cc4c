// src/watch/debouncer.rs

//! Settle-window debouncing of changed paths.
//!
//! Every observed change for a path refreshes that path's timestamp. A path
//! becomes *ready* once nothing has touched it for `settle_window`; the
//! polling loop collects ready paths with [`Debouncer::drain_ready`], which
//! removes them in the same critical section that selects them.
//!
//! `record` is called from the watcher side and `drain_ready` from the
//! monitor loop, so the table sits behind a single mutex and both
//! operations read the clock while holding it. That keeps timestamps
//! monotonic in lock order: whichever `record` acquires the lock last for a
//! path wins.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::trace;

use crate::watch::clock::{Clock, SystemClock};

/// Default quiet period before a path is handed downstream.
pub const DEFAULT_SETTLE_WINDOW: Duration = Duration::from_secs(2);

/// Thread-safe table of pending changes keyed by path.
#[derive(Debug)]
pub struct Debouncer {
    settle_window: Duration,
    clock: Arc<dyn Clock>,
    pending: Mutex<HashMap<PathBuf, Instant>>,
}

impl Debouncer {
    /// Debouncer driven by the system clock.
    pub fn new(settle_window: Duration) -> Self {
        Self::with_clock(settle_window, Arc::new(SystemClock))
    }

    /// Debouncer driven by an arbitrary time source (tests use
    /// [`ManualClock`](crate::watch::clock::ManualClock)).
    pub fn with_clock(settle_window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            settle_window,
            clock,
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn settle_window(&self) -> Duration {
        self.settle_window
    }

    /// Mark `path` as changed now, overwriting any earlier timestamp.
    pub fn record(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let mut pending = self.lock();
        let now = self.clock.now();
        if pending.insert(path.clone(), now).is_some() {
            trace!(?path, "re-armed pending change");
        } else {
            trace!(?path, "new pending change");
        }
    }

    /// Remove and return every path that has been quiet for at least the
    /// settle window. Paths still settling are left in place.
    pub fn drain_ready(&self) -> BTreeSet<PathBuf> {
        let mut pending = self.lock();
        let now = self.clock.now();
        let settle = self.settle_window;

        let mut ready = BTreeSet::new();
        pending.retain(|path, last_seen| {
            if now.duration_since(*last_seen) >= settle {
                ready.insert(path.clone());
                false
            } else {
                true
            }
        });

        if !ready.is_empty() {
            trace!(count = ready.len(), remaining = pending.len(), "drained settled changes");
        }
        ready
    }

    /// Number of paths currently waiting to settle.
    pub fn pending_len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    // A panic while holding the lock cannot leave the map half-updated:
    // every mutation is a single insert or retain.
    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Instant>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE_WINDOW)
    }
}
