// src/tasks/mod.rs

//! Pending-task scanner for `TODO.md`, `PLAN.md` and `CLAUDE.md`.
//!
//! - `TODO.md`: task headers (`### [HIGH] @feature - Title`) under
//!   `## Backlog` and `## In Progress`, plus plain `### Title` headers
//!   while in progress. `## Completed` is skipped.
//! - `PLAN.md`: every unchecked `- [ ] item`.
//! - `CLAUDE.md`: unchecked items and `TODO: item` lines.
//!
//! Missing or unreadable files simply contribute no tasks.

use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::debug;

use crate::errors::Result;
use crate::fs::FileSystem;

pub const TODO_FILE: &str = "TODO.md";
pub const PLAN_FILE: &str = "PLAN.md";
pub const CLAUDE_FILE: &str = "CLAUDE.md";

const IN_PROGRESS_PLACEHOLDER: &str = "_No tasks currently in progress_";

/// One pending task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    /// File the task came from, e.g. `TODO.md`.
    pub source: String,
    pub title: String,
    /// Upper-cased priority tag (`HIGH`, `MED`, `LOW`, ...).
    pub priority: Option<String>,
    /// Type tag including the `@`, e.g. `@feature`.
    #[serde(rename = "type")]
    pub task_type: Option<String>,
}

impl Task {
    fn plain(source: &str, title: &str) -> Self {
        Self {
            source: source.to_string(),
            title: title.trim().to_string(),
            priority: None,
            task_type: None,
        }
    }

    fn priority_rank(&self) -> u8 {
        match self.priority.as_deref() {
            Some("HIGH") => 0,
            Some("MED") => 1,
            Some("LOW") => 2,
            _ => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    InProgress,
    Backlog,
    Completed,
    Other,
}

impl Section {
    fn from_heading(name: &str) -> Self {
        match name {
            "In Progress" => Section::InProgress,
            "Backlog" => Section::Backlog,
            "Completed" => Section::Completed,
            _ => Section::Other,
        }
    }
}

/// Compiled line patterns.
#[derive(Debug, Clone)]
pub struct TaskScanner {
    task_header: Regex,
    unchecked: Regex,
    todo_line: Regex,
}

impl TaskScanner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            task_header: Regex::new(r"^###\s+\[(\w+)\]\s+(@\w+)\s+-\s+(.+)$")
                .map_err(anyhow::Error::from)?,
            unchecked: Regex::new(r"^-\s+\[\s*\]\s+(.+)$").map_err(anyhow::Error::from)?,
            todo_line: RegexBuilder::new(r"^TODO:\s+(.+)$")
                .case_insensitive(true)
                .build()
                .map_err(anyhow::Error::from)?,
        })
    }

    fn header_task(&self, line: &str) -> Option<Task> {
        let caps = self.task_header.captures(line)?;
        Some(Task {
            source: TODO_FILE.to_string(),
            title: caps[3].trim().to_string(),
            priority: Some(caps[1].to_uppercase()),
            task_type: Some(caps[2].to_string()),
        })
    }

    fn unchecked_title<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.unchecked
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Tasks from the contents of a `TODO.md`.
    pub fn parse_todo_md(&self, content: &str) -> Vec<Task> {
        let mut tasks = Vec::new();
        let mut section = Section::None;

        for line in content.lines() {
            let stripped = line.trim();

            if let Some(name) = stripped.strip_prefix("## ") {
                section = Section::from_heading(name.trim());
                continue;
            }

            match section {
                Section::Backlog => {
                    if let Some(task) = self.header_task(stripped) {
                        tasks.push(task);
                    }
                }
                Section::InProgress => {
                    if stripped.contains(IN_PROGRESS_PLACEHOLDER) {
                        continue;
                    }
                    if let Some(task) = self.header_task(stripped) {
                        tasks.push(task);
                        continue;
                    }
                    if stripped.starts_with("### ") && !stripped.starts_with("### [") {
                        let title = stripped["### ".len()..].trim();
                        if !title.is_empty() {
                            tasks.push(Task::plain(TODO_FILE, title));
                        }
                    }
                }
                Section::Completed | Section::Other | Section::None => {}
            }
        }

        tasks
    }

    /// Unchecked items from the contents of a `PLAN.md`.
    pub fn parse_plan_md(&self, content: &str) -> Vec<Task> {
        content
            .lines()
            .filter_map(|line| self.unchecked_title(line.trim()))
            .map(|title| Task::plain(PLAN_FILE, title))
            .collect()
    }

    /// Unchecked items and `TODO:` lines from the contents of a `CLAUDE.md`.
    pub fn parse_claude_md(&self, content: &str) -> Vec<Task> {
        let mut tasks = Vec::new();
        for line in content.lines() {
            let stripped = line.trim();
            if let Some(title) = self.unchecked_title(stripped) {
                tasks.push(Task::plain(CLAUDE_FILE, title));
            } else if let Some(caps) = self.todo_line.captures(stripped) {
                tasks.push(Task::plain(CLAUDE_FILE, &caps[1]));
            }
        }
        tasks
    }

    fn scan_file<F>(&self, fs: &dyn FileSystem, path: &Path, parse: F) -> Vec<Task>
    where
        F: Fn(&Self, &str) -> Vec<Task>,
    {
        if !fs.is_file(path) {
            return Vec::new();
        }
        match fs.read_to_string(path) {
            Ok(content) => parse(self, &content),
            Err(err) => {
                debug!(?path, error = %err, "could not read task file; skipping");
                Vec::new()
            }
        }
    }

    /// All pending tasks under `dir`, highest priority first.
    ///
    /// Order within a priority follows file order (TODO, PLAN, CLAUDE) and
    /// line order.
    pub fn pending_tasks(&self, fs: &dyn FileSystem, dir: &Path) -> Vec<Task> {
        let mut tasks = self.scan_file(fs, &dir.join(TODO_FILE), Self::parse_todo_md);
        tasks.extend(self.scan_file(fs, &dir.join(PLAN_FILE), Self::parse_plan_md));
        tasks.extend(self.scan_file(fs, &dir.join(CLAUDE_FILE), Self::parse_claude_md));

        tasks.sort_by_key(Task::priority_rank);
        tasks
    }
}

/// Pending tasks under `dir`, highest priority first.
pub fn get_pending_tasks(fs: &dyn FileSystem, dir: &Path) -> Result<Vec<Task>> {
    Ok(TaskScanner::new()?.pending_tasks(fs, dir))
}

pub fn has_pending_tasks(fs: &dyn FileSystem, dir: &Path) -> Result<bool> {
    Ok(!get_pending_tasks(fs, dir)?.is_empty())
}

/// Human-readable listing, one task per line.
pub fn format_text(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "No pending tasks.".to_string();
    }

    let mut out = format!("Pending tasks ({}):\n", tasks.len());
    for (i, task) in tasks.iter().enumerate() {
        let priority = task
            .priority
            .as_deref()
            .map(|p| format!("[{p}]"))
            .unwrap_or_else(|| "[---]".to_string());
        let task_type = task.task_type.as_deref().unwrap_or("---");
        out.push_str(&format!(
            "  {}. {priority} {task_type}: {} ({})\n",
            i + 1,
            task.title,
            task.source
        ));
    }
    out
}

pub fn format_json(tasks: &[Task]) -> Result<String> {
    Ok(serde_json::to_string_pretty(tasks).map_err(anyhow::Error::from)?)
}
