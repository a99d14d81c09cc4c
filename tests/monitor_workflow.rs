// tests/monitor_workflow.rs

mod common;
use crate::common::{init_tracing, manual_debouncer, with_timeout, TestResult};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use watchfix::agent::AgentMessage;
use watchfix::engine::{BatchOutcome, CycleReport, Monitor, MonitorOptions, Toolset};
use watchfix::errors::WatchfixError;
use watchfix::fs::mock::MockFileSystem;
use watchfix::shutdown_on;
use watchfix::watch::{Debouncer, ManualClock};
use watchfix_test_utils::{ConfigFileBuilder, ScriptedApprover, ScriptedBackend, ScriptedResponse};

struct Harness {
    debouncer: Arc<Debouncer>,
    clock: ManualClock,
    fs: MockFileSystem,
    backend: ScriptedBackend,
    approver: ScriptedApprover,
}

impl Harness {
    fn new(approver: ScriptedApprover) -> Self {
        init_tracing();
        let (debouncer, clock) = manual_debouncer(2.0);
        Self {
            debouncer,
            clock,
            fs: MockFileSystem::new(),
            backend: ScriptedBackend::new(),
            approver,
        }
    }

    fn monitor(&self, skip_unchanged: bool) -> Monitor {
        let cfg = ConfigFileBuilder::new()
            .poll_interval_secs(0.01)
            .skip_unchanged(skip_unchanged)
            .build();
        Monitor::new(
            Arc::clone(&self.debouncer),
            Arc::new(self.fs.clone()),
            Arc::new(self.backend.clone()),
            Arc::new(self.approver.clone()),
            Toolset::from_config(&cfg),
            MonitorOptions::from_config(&cfg, "/proj"),
        )
    }

    /// Record `files` (creating them on the mock fs) and let them settle.
    fn settle(&self, files: &[&str]) {
        for f in files {
            self.fs.add_file(f, format!("# {f}\n"));
            self.debouncer.record(*f);
        }
        self.clock.advance(Duration::from_secs(2));
    }
}

#[tokio::test]
async fn idle_when_nothing_settled() -> TestResult {
    let h = Harness::new(ScriptedApprover::default());
    let mut monitor = h.monitor(false);

    h.debouncer.record("/proj/a.py");
    assert_eq!(monitor.poll_once().await?, CycleReport::Idle);
    assert!(h.backend.requests().is_empty());
    assert_eq!(monitor.stats().polls, 1);
    Ok(())
}

#[tokio::test]
async fn clean_analysis_does_not_ask_for_approval() -> TestResult {
    let h = Harness::new(ScriptedApprover::default());
    h.backend.push_text("Everything looks good.");
    let mut monitor = h.monitor(false);

    h.settle(&["/proj/b.py", "/proj/a.py"]);
    let report = monitor.poll_once().await?;

    assert_eq!(
        report,
        CycleReport::Analyzed {
            files: 2,
            outcome: BatchOutcome::Clean
        }
    );
    assert!(h.approver.questions().is_empty());

    let requests = h.backend.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].prompt.contains("  - /proj/a.py\n  - /proj/b.py"));
    assert_eq!(requests[0].allowed_tools, vec!["Read", "Glob", "Grep"]);
    assert_eq!(requests[0].cwd, Some(PathBuf::from("/proj")));
    Ok(())
}

#[tokio::test]
async fn approved_fixes_run_the_fix_query() -> TestResult {
    let h = Harness::new(ScriptedApprover::new([Some(true)]));
    h.backend
        .push_text("There is a bug on line 2; you should guard the index.")
        .push(ScriptedResponse::Messages(vec![
            Ok(AgentMessage::ToolUse("Edit".into())),
            Ok(AgentMessage::Chunk("Patched.".into())),
        ]));
    let mut monitor = h.monitor(false);

    h.settle(&["/proj/a.py"]);
    let report = monitor.poll_once().await?;

    assert_eq!(
        report,
        CycleReport::Analyzed {
            files: 1,
            outcome: BatchOutcome::FixesApplied
        }
    );
    assert_eq!(
        h.approver.questions(),
        vec!["Would you like me to apply the suggested fixes?"]
    );

    let requests = h.backend.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[1]
        .prompt
        .contains("Based on your previous analysis:\nThere is a bug on line 2"));
    assert_eq!(
        requests[1].allowed_tools,
        vec!["Read", "Edit", "Write", "Glob", "Grep"]
    );
    Ok(())
}

#[tokio::test]
async fn declined_fixes_skip_the_fix_query() -> TestResult {
    let h = Harness::new(ScriptedApprover::new([Some(false)]));
    h.backend.push_text("Found an issue with error handling.");
    let mut monitor = h.monitor(false);

    h.settle(&["/proj/a.py"]);
    let report = monitor.poll_once().await?;

    assert_eq!(
        report,
        CycleReport::Analyzed {
            files: 1,
            outcome: BatchOutcome::FixesDeclined
        }
    );
    assert_eq!(h.backend.requests().len(), 1);
    Ok(())
}

#[tokio::test]
async fn vanished_files_are_dropped_and_empty_batches_skipped() -> TestResult {
    let h = Harness::new(ScriptedApprover::default());
    h.backend.push_text("Looks fine.");
    let mut monitor = h.monitor(false);

    h.settle(&["/proj/a.py", "/proj/tmp.py"]);
    h.fs.remove("/proj/tmp.py");
    let report = monitor.poll_once().await?;
    assert_eq!(
        report,
        CycleReport::Analyzed {
            files: 1,
            outcome: BatchOutcome::Clean
        }
    );
    assert!(!h.backend.prompts()[0].contains("tmp.py"));

    h.settle(&["/proj/gone.py"]);
    h.fs.remove("/proj/gone.py");
    assert_eq!(monitor.poll_once().await?, CycleReport::Skipped);
    assert_eq!(h.backend.requests().len(), 1);
    assert_eq!(monitor.stats().vanished, 2);
    Ok(())
}

#[tokio::test]
async fn agent_failures_are_contained() -> TestResult {
    let h = Harness::new(ScriptedApprover::default());
    h.backend
        .push(ScriptedResponse::StartFailure("agent not installed".into()))
        .push(ScriptedResponse::Messages(vec![
            Ok(AgentMessage::Chunk("partial".into())),
            Err("rate limited".into()),
        ]))
        .push_text("All good.");
    let mut monitor = h.monitor(false);

    h.settle(&["/proj/a.py"]);
    assert!(matches!(monitor.poll_once().await?, CycleReport::Failed(msg) if msg.contains("agent not installed")));

    h.settle(&["/proj/a.py"]);
    assert!(matches!(monitor.poll_once().await?, CycleReport::Failed(msg) if msg.contains("rate limited")));

    h.settle(&["/proj/a.py"]);
    assert!(matches!(
        monitor.poll_once().await?,
        CycleReport::Analyzed { outcome: BatchOutcome::Clean, .. }
    ));
    assert_eq!(monitor.stats().failures, 2);
    Ok(())
}

#[tokio::test]
async fn closed_approval_input_stops_the_monitor() -> TestResult {
    let h = Harness::new(ScriptedApprover::new([None]));
    h.backend.push_text("There is a problem here.");
    let mut monitor = h.monitor(false);

    h.settle(&["/proj/a.py"]);
    let err = monitor.poll_once().await.unwrap_err();
    assert!(matches!(err, WatchfixError::ApprovalInputClosed));
    Ok(())
}

#[tokio::test]
async fn unchanged_content_is_skipped_when_enabled() -> TestResult {
    let h = Harness::new(ScriptedApprover::default());
    h.backend.push_text("Fine.").push_text("Fine.");
    let mut monitor = h.monitor(true);

    h.settle(&["/proj/a.py"]);
    assert!(matches!(monitor.poll_once().await?, CycleReport::Analyzed { .. }));

    // Same bytes written again.
    h.settle(&["/proj/a.py"]);
    assert_eq!(monitor.poll_once().await?, CycleReport::Skipped);
    assert_eq!(monitor.stats().unchanged, 1);

    h.fs.add_file("/proj/a.py", "changed = True\n");
    h.debouncer.record("/proj/a.py");
    h.clock.advance(Duration::from_secs(2));
    assert!(matches!(monitor.poll_once().await?, CycleReport::Analyzed { .. }));
    assert_eq!(h.backend.requests().len(), 2);
    Ok(())
}

#[tokio::test]
async fn run_processes_batches_until_shutdown() -> TestResult {
    let h = Harness::new(ScriptedApprover::default());
    h.backend.push_text("Looks good.");
    let monitor = h.monitor(false);

    h.settle(&["/proj/a.py"]);

    let (tx, rx) = watch::channel(false);
    let task = tokio::spawn(monitor.run(rx));

    with_timeout(async {
        while h.backend.requests().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;

    tx.send(true)?;
    let stats = with_timeout(task).await??;
    assert_eq!(stats.batches, 1);
    assert_eq!(stats.files_analyzed, 1);
    Ok(())
}

#[tokio::test]
async fn shutdown_abandons_an_in_flight_batch() -> TestResult {
    let h = Harness::new(ScriptedApprover::default());
    h.backend.push(ScriptedResponse::Hang);
    let monitor = h.monitor(false);

    h.settle(&["/proj/a.py"]);

    let (tx, rx) = watch::channel(false);
    let task = tokio::spawn(monitor.run(rx));

    with_timeout(async {
        while h.backend.requests().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;

    tx.send(true)?;
    let stats = with_timeout(task).await??;
    assert_eq!(stats.batches, 1);

    with_timeout(async {
        while h.backend.abandoned() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    Ok(())
}

#[tokio::test]
async fn always_approving_applies_fixes_for_every_batch() -> TestResult {
    let h = Harness::new(ScriptedApprover::always(true));
    h.backend
        .push_text("Found a bug in the parser.")
        .push_text("Fixed.")
        .push_text("Another issue: this should be guarded.")
        .push_text("Fixed again.");
    let mut monitor = h.monitor(false);

    for _ in 0..2 {
        h.settle(&["/proj/a.py"]);
        assert!(matches!(
            monitor.poll_once().await?,
            CycleReport::Analyzed { outcome: BatchOutcome::FixesApplied, .. }
        ));
    }
    assert_eq!(h.approver.questions().len(), 2);
    assert_eq!(h.backend.requests().len(), 4);
    Ok(())
}

#[tokio::test]
async fn shutdown_flag_flips_when_the_signal_fires() -> TestResult {
    let (fire_tx, fire_rx) = tokio::sync::oneshot::channel::<()>();
    let mut rx = shutdown_on(async move {
        let _ = fire_rx.await;
        Ok(())
    });

    assert!(!*rx.borrow());
    fire_tx.send(()).map_err(|_| "signal receiver dropped")?;
    with_timeout(rx.changed()).await?;
    assert!(*rx.borrow());
    Ok(())
}

#[tokio::test]
async fn failed_signal_registration_keeps_the_monitor_running() -> TestResult {
    let h = Harness::new(ScriptedApprover::default());
    h.backend.push_text("Looks good.");
    let monitor = h.monitor(false);

    let rx = shutdown_on(async {
        Err(std::io::Error::other("signal handler unavailable"))
    });
    let task = tokio::spawn(monitor.run(rx));

    // Let the failing listener run; the monitor must still pick up work.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!task.is_finished());

    h.settle(&["/proj/a.py"]);
    with_timeout(async {
        while h.backend.requests().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(!task.is_finished());
    task.abort();
    Ok(())
}
