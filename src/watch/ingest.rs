// src/watch/ingest.rs

//! Adapter from raw filesystem notifications to debouncer records.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind};
use tracing::trace;

use crate::fs::FileSystem;
use crate::types::ChangeKind;
use crate::watch::debouncer::Debouncer;
use crate::watch::ignore::IgnoreRules;
use crate::watch::path_utils::relative_path;

/// A single path pulled out of a `notify` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedChange {
    pub path: PathBuf,
    pub kind: ChangeKind,
    /// `true` when the backend already told us this is a directory.
    pub known_directory: bool,
}

/// Reduce a `notify` event to the created/modified paths we care about.
///
/// Removals, access events and the source side of a rename produce nothing.
pub fn classify(event: &Event) -> Vec<ObservedChange> {
    let single = |kind: ChangeKind, known_directory: bool| -> Vec<ObservedChange> {
        event
            .paths
            .iter()
            .map(|path| ObservedChange {
                path: path.clone(),
                kind,
                known_directory,
            })
            .collect()
    };

    match event.kind {
        EventKind::Create(CreateKind::Folder) => single(ChangeKind::Created, true),
        EventKind::Create(_) => single(ChangeKind::Created, false),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => single(ChangeKind::Created, false),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => event
            .paths
            .get(1)
            .map(|to| {
                vec![ObservedChange {
                    path: to.clone(),
                    kind: ChangeKind::Created,
                    known_directory: false,
                }]
            })
            .unwrap_or_default(),
        EventKind::Modify(ModifyKind::Name(_)) => Vec::new(),
        EventKind::Modify(_) => single(ChangeKind::Modified, false),
        EventKind::Remove(_) | EventKind::Access(_) | EventKind::Any | EventKind::Other => {
            Vec::new()
        }
    }
}

/// Filters notifications and records surviving paths on the debouncer.
#[derive(Debug, Clone)]
pub struct EventIngestor {
    root: PathBuf,
    rules: IgnoreRules,
    debouncer: Arc<Debouncer>,
}

impl EventIngestor {
    pub fn new(root: impl Into<PathBuf>, rules: IgnoreRules, debouncer: Arc<Debouncer>) -> Self {
        Self {
            root: root.into(),
            rules,
            debouncer,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn debouncer(&self) -> &Arc<Debouncer> {
        &self.debouncer
    }

    /// Whether `path` is filtered out by the ignore rules.
    ///
    /// Segments are checked relative to the watch root so that a root that
    /// itself lives under e.g. `venv/` still works.
    pub fn is_ignored(&self, path: &Path) -> bool {
        match relative_path(&self.root, path) {
            Some(rel) => self.rules.is_ignored(&rel),
            None => self.rules.is_ignored(path),
        }
    }

    /// Handle one change notification. Returns `true` if it was recorded.
    pub fn on_event(&self, path: &Path, is_directory: bool, kind: ChangeKind) -> bool {
        if is_directory || self.is_ignored(path) {
            trace!(?path, %kind, is_directory, "dropping change");
            return false;
        }
        trace!(?path, %kind, "recording change");
        self.debouncer.record(path);
        true
    }

    /// Classify a raw `notify` event and feed each path through
    /// [`on_event`](Self::on_event). Returns how many paths were recorded.
    pub fn ingest(&self, fs: &dyn FileSystem, event: &Event) -> usize {
        classify(event)
            .into_iter()
            .filter(|change| {
                let is_directory = change.known_directory || fs.is_dir(&change.path);
                self.on_event(&change.path, is_directory, change.kind)
            })
            .count()
    }
}
