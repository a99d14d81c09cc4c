// src/engine/mod.rs

//! Orchestration engine for watchfix.
//!
//! This module ties together:
//! - the debouncer (settled paths come out of [`crate::watch::Debouncer`])
//! - the analysis/fix workflow run for each batch of settled files
//! - the interactive approval seam between analysis and fixing
//! - the polling loop that drives all of the above until shutdown
//!
//! The per-batch logic lives in [`workflow`]; the async polling shell is
//! implemented in [`monitor`].

use std::path::PathBuf;
use std::time::Duration;

use crate::config::ConfigFile;

pub mod approval;
pub mod monitor;
pub mod prompt;
pub mod workflow;

pub use approval::{parse_approval, prompt_until_valid, Approver, TerminalApprover};
pub use monitor::{Monitor, MonitorStats};
pub use workflow::{analyze_batch, apply_fixes, needs_fixes};

/// How a batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The analysis found nothing worth fixing.
    Clean,
    /// Fixes were proposed and the user said no.
    FixesDeclined,
    /// Fixes were proposed, approved and the fix query completed.
    FixesApplied,
}

/// Result of one monitor poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleReport {
    /// Nothing had settled.
    Idle,
    /// Paths settled but none were left to analyze (vanished or unchanged).
    Skipped,
    /// The workflow ran for this many files.
    Analyzed { files: usize, outcome: BatchOutcome },
    /// The workflow failed; polling continues.
    Failed(String),
}

/// Tools granted to the agent in each phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolset {
    pub analysis: Vec<String>,
    pub fix: Vec<String>,
}

impl Toolset {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            analysis: cfg.agent().analysis_tools.clone(),
            fix: cfg.agent().fix_tools.clone(),
        }
    }
}

/// Knobs for the polling loop.
#[derive(Debug, Clone)]
pub struct MonitorOptions {
    pub poll_interval: Duration,
    pub skip_unchanged: bool,
    /// Working directory handed to the agent (the watch root).
    pub cwd: PathBuf,
}

impl MonitorOptions {
    pub fn from_config(cfg: &ConfigFile, cwd: impl Into<PathBuf>) -> Self {
        Self {
            poll_interval: cfg.watch().poll_interval,
            skip_unchanged: cfg.watch().skip_unchanged,
            cwd: cwd.into(),
        }
    }
}
