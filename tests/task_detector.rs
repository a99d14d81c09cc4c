// tests/task_detector.rs

mod common;
use crate::common::TestResult;

use std::fs;

use watchfix::fs::RealFileSystem;
use watchfix::tasks::{format_json, format_text, get_pending_tasks, has_pending_tasks};

const TODO: &str = "# TODO

## In Progress

### [HIGH] @feature - Implement file logging

**Goal:** Persist agent activity.

---

## Backlog

### [LOW] @test - Add unit tests

### [MED] @feature - Support watching multiple directories

---

## Completed

- [x] Done task
### [HIGH] @infra - Already shipped
";

const PLAN: &str = "# Project Plan

## Phase 1 (Completed)

- [x] Set up project structure

## Phase 2 (Future)

- [ ] Add configuration file support
- [ ] Implement logging to file
- [x] Create documentation
";

const CLAUDE: &str = "# CLAUDE.md

## Action Items

- [ ] Update documentation
TODO: Add more examples

## Guidelines

Follow the style guide.
";

#[test]
fn scans_all_three_files_from_disk() -> TestResult {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("TODO.md"), TODO)?;
    fs::write(dir.path().join("PLAN.md"), PLAN)?;
    fs::write(dir.path().join("CLAUDE.md"), CLAUDE)?;

    let tasks = get_pending_tasks(&RealFileSystem, dir.path())?;
    let summary: Vec<(Option<&str>, &str, &str)> = tasks
        .iter()
        .map(|t| (t.priority.as_deref(), t.source.as_str(), t.title.as_str()))
        .collect();

    assert_eq!(
        summary,
        vec![
            (Some("HIGH"), "TODO.md", "Implement file logging"),
            (Some("MED"), "TODO.md", "Support watching multiple directories"),
            (Some("LOW"), "TODO.md", "Add unit tests"),
            (None, "PLAN.md", "Add configuration file support"),
            (None, "PLAN.md", "Implement logging to file"),
            (None, "CLAUDE.md", "Update documentation"),
            (None, "CLAUDE.md", "Add more examples"),
        ]
    );
    Ok(())
}

#[test]
fn empty_directory_has_no_tasks() -> TestResult {
    let dir = tempfile::tempdir()?;
    assert!(!has_pending_tasks(&RealFileSystem, dir.path())?);
    assert_eq!(format_text(&[]), "No pending tasks.");

    fs::write(dir.path().join("PLAN.md"), "- [ ] Do something")?;
    assert!(has_pending_tasks(&RealFileSystem, dir.path())?);
    Ok(())
}

#[test]
fn a_directory_named_like_a_task_file_is_skipped() -> TestResult {
    let dir = tempfile::tempdir()?;
    fs::create_dir(dir.path().join("TODO.md"))?;
    fs::write(dir.path().join("CLAUDE.md"), "todo: check the watcher\n")?;

    let tasks = get_pending_tasks(&RealFileSystem, dir.path())?;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "check the watcher");
    Ok(())
}

#[test]
fn reports_render_in_both_formats() -> TestResult {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("TODO.md"), TODO)?;
    let tasks = get_pending_tasks(&RealFileSystem, dir.path())?;

    let text = format_text(&tasks);
    assert!(text.starts_with("Pending tasks (3):\n"));
    assert!(text.contains("  1. [HIGH] @feature: Implement file logging (TODO.md)"));

    let json: serde_json::Value = serde_json::from_str(&format_json(&tasks)?)?;
    assert_eq!(json[0]["priority"], "HIGH");
    assert_eq!(json[0]["type"], "@feature");
    assert_eq!(json[0]["source"], "TODO.md");
    Ok(())
}
