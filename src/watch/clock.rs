// src/watch/clock.rs

//! Time sources for the debouncer.
//!
//! Production code uses [`SystemClock`]. Tests share a [`ManualClock`]
//! between the test body and the debouncer so that settle windows can be
//! crossed deterministically, without sleeping.

use std::fmt::Debug;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Monotonic time source.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

/// Wall-clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
///
/// Cloning yields a handle onto the same underlying time, so a test can keep
/// one handle and give another to the code under test.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Move time forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(PoisonError::into_inner);
        *elapsed += by;
    }

    /// Jump to an absolute offset from the clock's origin.
    ///
    /// Moving backwards is ignored; the clock stays monotonic.
    pub fn set_elapsed(&self, to: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(PoisonError::into_inner);
        if to > *elapsed {
            *elapsed = to;
        }
    }

    /// Convenience for tests that think in fractional seconds.
    pub fn set_elapsed_secs(&self, secs: f64) {
        self.set_elapsed(Duration::from_secs_f64(secs));
    }

    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }
}
