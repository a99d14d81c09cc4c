#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use watchfix_test_utils::{init_tracing, with_timeout};

use watchfix::watch::{Debouncer, ManualClock};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Debouncer driven by a manual clock; returns both handles.
pub fn manual_debouncer(settle_secs: f64) -> (Arc<Debouncer>, ManualClock) {
    let clock = ManualClock::new();
    let debouncer = Debouncer::with_clock(
        std::time::Duration::from_secs_f64(settle_secs),
        Arc::new(clock.clone()),
    );
    (Arc::new(debouncer), clock)
}

/// Sorted path list, handy for comparing drain results.
pub fn paths<I, P>(items: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut out: Vec<PathBuf> = items.into_iter().map(|p| p.as_ref().to_path_buf()).collect();
    out.sort();
    out
}
