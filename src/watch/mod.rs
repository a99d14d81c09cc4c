// src/watch/mod.rs

//! File watching and change coalescing.
//!
//! This module is responsible for:
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Filtering noise (VCS/dependency directories, bytecode, exclude globs).
//! - Debouncing: holding each changed path until it has been quiet for the
//!   settle window, then handing it out exactly once.
//! - (Optionally) content hashing so byte-identical rewrites are skipped.
//!
//! It does **not** know about the agent; it only turns filesystem changes
//! into settled paths.

pub mod clock;
pub mod debouncer;
pub mod hash;
pub mod ignore;
pub mod ingest;
pub mod path_utils;
pub mod watcher;

pub use clock::{Clock, ManualClock, SystemClock};
pub use debouncer::{Debouncer, DEFAULT_SETTLE_WINDOW};
pub use hash::{compute_file_hash, MemoryHashStore};
pub use ignore::{IgnoreRules, DEFAULT_IGNORE_NAMES, DEFAULT_IGNORE_SUFFIXES};
pub use ingest::{classify, EventIngestor, ObservedChange};
pub use watcher::{spawn_watcher, WatcherHandle};
