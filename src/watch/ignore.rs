// src/watch/ignore.rs

//! Path filtering applied before a change reaches the debouncer.
//!
//! Three independent rules, any of which ignores a path:
//!
//! - a path *segment* exactly equals one of the ignored names
//!   (`.git`, `node_modules`, ...). `mygitrepo.py` is not ignored by `.git`.
//! - the path ends with one of the ignored suffixes (`.pyc`, ...).
//! - the root-relative path matches one of the optional `exclude` globs.

use std::collections::HashSet;
use std::fmt;
use std::path::{Component, Path};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Version-control, dependency, virtualenv and bytecode-cache directories.
pub const DEFAULT_IGNORE_NAMES: &[&str] = &[".git", "__pycache__", "venv", ".venv", "node_modules"];

/// Compiled bytecode.
pub const DEFAULT_IGNORE_SUFFIXES: &[&str] = &[".pyc", ".pyo"];

#[derive(Clone)]
pub struct IgnoreRules {
    names: HashSet<String>,
    suffixes: Vec<String>,
    exclude: Option<GlobSet>,
}

impl fmt::Debug for IgnoreRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IgnoreRules")
            .field("names", &self.names)
            .field("suffixes", &self.suffixes)
            .field("has_exclude_globs", &self.exclude.is_some())
            .finish()
    }
}

impl IgnoreRules {
    pub fn new<N, S>(names: N, suffixes: S, exclude: &[String]) -> Result<Self>
    where
        N: IntoIterator,
        N::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        let exclude = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude).context("building exclude globset")?)
        };

        Ok(Self {
            names: names.into_iter().map(Into::into).collect(),
            suffixes: suffixes.into_iter().map(Into::into).collect(),
            exclude,
        })
    }

    /// The built-in name and suffix sets, no globs.
    pub fn defaults() -> Self {
        Self {
            names: DEFAULT_IGNORE_NAMES.iter().map(|s| s.to_string()).collect(),
            suffixes: DEFAULT_IGNORE_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            exclude: None,
        }
    }

    /// `true` if `path` should never reach the debouncer.
    ///
    /// Callers pass the path relative to the watch root when they can, so
    /// that directories *above* the root do not count as segments.
    pub fn is_ignored(&self, path: &Path) -> bool {
        self.has_ignored_segment(path) || self.has_ignored_suffix(path) || self.is_excluded(path)
    }

    fn has_ignored_segment(&self, path: &Path) -> bool {
        path.components().any(|component| match component {
            Component::Normal(segment) => self.names.contains(segment.to_string_lossy().as_ref()),
            _ => false,
        })
    }

    fn has_ignored_suffix(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        self.suffixes.iter().any(|suffix| path.ends_with(suffix.as_str()))
    }

    fn is_excluded(&self, path: &Path) -> bool {
        match &self.exclude {
            Some(set) => set.is_match(path.to_string_lossy().replace('\\', "/")),
            None => false,
        }
    }
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Build a GlobSet from simple string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
