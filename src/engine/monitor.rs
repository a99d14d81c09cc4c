// src/engine/monitor.rs

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::agent::AgentBackend;
use crate::engine::approval::Approver;
use crate::engine::workflow::analyze_batch;
use crate::engine::{CycleReport, MonitorOptions, Toolset};
use crate::errors::{Result, WatchfixError};
use crate::fs::FileSystem;
use crate::watch::debouncer::Debouncer;
use crate::watch::hash::MemoryHashStore;

/// Counters reported when the monitor stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub polls: u64,
    pub batches: u64,
    pub files_analyzed: u64,
    pub vanished: u64,
    pub unchanged: u64,
    pub failures: u64,
}

/// The polling loop.
///
/// Every `poll_interval` it drains settled paths from the debouncer, drops
/// the ones that no longer exist (and, with `skip_unchanged`, the ones whose
/// content hash did not move), and runs the workflow for what is left.
/// Batches never overlap: the next poll only starts once the current batch
/// has finished.
pub struct Monitor {
    debouncer: Arc<Debouncer>,
    fs: Arc<dyn FileSystem>,
    backend: Arc<dyn AgentBackend>,
    approver: Arc<dyn Approver>,
    toolset: Toolset,
    options: MonitorOptions,
    hashes: MemoryHashStore,
    stats: MonitorStats,
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("debouncer", &self.debouncer)
            .field("options", &self.options)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Monitor {
    pub fn new(
        debouncer: Arc<Debouncer>,
        fs: Arc<dyn FileSystem>,
        backend: Arc<dyn AgentBackend>,
        approver: Arc<dyn Approver>,
        toolset: Toolset,
        options: MonitorOptions,
    ) -> Self {
        Self {
            debouncer,
            fs,
            backend,
            approver,
            toolset,
            options,
            hashes: MemoryHashStore::new(),
            stats: MonitorStats::default(),
        }
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    /// Drain settled paths and filter them down to the batch to analyze.
    ///
    /// Returns `None` when nothing had settled.
    pub fn next_batch(&mut self) -> Option<Vec<PathBuf>> {
        let ready = self.debouncer.drain_ready();
        if ready.is_empty() {
            return None;
        }

        let mut batch = Vec::with_capacity(ready.len());
        for path in ready {
            if !self.fs.exists(&path) {
                debug!(?path, "settled path no longer exists; skipping");
                self.stats.vanished += 1;
                continue;
            }
            if self.options.skip_unchanged && !self.hashes.content_changed(self.fs.as_ref(), &path)
            {
                self.stats.unchanged += 1;
                continue;
            }
            batch.push(path);
        }
        Some(batch)
    }

    /// One poll: drain, filter, and run the workflow if anything is left.
    ///
    /// Workflow failures are contained in the report. The only error that
    /// escapes is a closed approval input, since no later batch could be
    /// approved either.
    pub async fn poll_once(&mut self) -> Result<CycleReport> {
        self.stats.polls += 1;

        let batch = match self.next_batch() {
            None => return Ok(CycleReport::Idle),
            Some(batch) if batch.is_empty() => return Ok(CycleReport::Skipped),
            Some(batch) => batch,
        };

        self.stats.batches += 1;
        self.stats.files_analyzed += batch.len() as u64;
        info!(files = batch.len(), "analyzing settled changes");

        let result = analyze_batch(
            self.backend.as_ref(),
            self.approver.as_ref(),
            &self.toolset,
            &self.options.cwd,
            &batch,
        )
        .await;

        match result {
            Ok(outcome) => {
                info!(?outcome, "batch finished");
                Ok(CycleReport::Analyzed {
                    files: batch.len(),
                    outcome,
                })
            }
            Err(WatchfixError::ApprovalInputClosed) => Err(WatchfixError::ApprovalInputClosed),
            Err(err) => {
                self.stats.failures += 1;
                warn!(error = %err, "analysis failed; continuing to monitor");
                eprintln!("Error during analysis: {err}");
                Ok(CycleReport::Failed(err.to_string()))
            }
        }
    }

    /// Poll until `shutdown` flips to `true` (or its sender goes away).
    ///
    /// A batch in flight when shutdown arrives is abandoned; dropping its
    /// agent stream kills the agent process.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<MonitorStats> {
        info!(
            poll_interval = ?self.options.poll_interval,
            skip_unchanged = self.options.skip_unchanged,
            "monitor started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                report = self.poll_once() => {
                    let report = report?;
                    if report != CycleReport::Idle {
                        debug!(?report, "poll finished");
                    }
                }
                _ = shutdown.changed() => {
                    info!("shutdown requested during poll");
                    break;
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.options.poll_interval) => {}
                _ = shutdown.changed() => {
                    info!("shutdown requested");
                    break;
                }
            }
        }

        info!(stats = ?self.stats, "monitor stopped");
        Ok(self.stats)
    }
}
