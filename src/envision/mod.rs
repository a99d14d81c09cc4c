// src/envision/mod.rs

//! One-shot codebase improvement analyzer.
//!
//! Asks the agent (read-only tools, bounded turns and wall time) for a few
//! small improvements in a fixed block format, parses the blocks, filters
//! by category and reports them as text or JSON. Nothing is changed on
//! disk.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::agent::{AgentBackend, QueryRequest, ResponseAccumulator};
use crate::config::ConfigFile;
use crate::errors::Result;
use crate::types::CategoryFilter;

const BLOCK_START: &str = "---IMPROVEMENT---";
const BLOCK_END: &str = "---END---";
const MAX_ESTIMATE_MINUTES: u32 = 10;

/// A proposed improvement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Improvement {
    pub category: String,
    pub title: String,
    pub description: String,
    pub file_path: Option<String>,
    pub estimated_time_minutes: u32,
    pub priority: String,
}

impl Improvement {
    fn priority_rank(&self) -> u8 {
        match self.priority.as_str() {
            "high" => 0,
            "low" => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnvisionResult {
    pub improvements: Vec<Improvement>,
    /// Wall time, rounded to two decimals.
    pub analysis_time_seconds: f64,
    pub files_analyzed: usize,
    pub max_agents: usize,
}

#[derive(Debug, Clone)]
pub struct EnvisionOptions {
    /// Reported only; the analysis always runs a single agent.
    pub max_agents: usize,
    pub max_time: Duration,
    pub category: CategoryFilter,
    pub max_turns: u32,
    pub tools: Vec<String>,
    pub cwd: PathBuf,
}

impl EnvisionOptions {
    pub fn from_config(cfg: &ConfigFile, cwd: impl Into<PathBuf>) -> Self {
        Self {
            max_agents: 3,
            max_time: Duration::from_secs(600),
            category: CategoryFilter::All,
            max_turns: cfg.envision().max_turns,
            tools: cfg.envision().read_only_tools.clone(),
            cwd: cwd.into(),
        }
    }
}

pub fn build_envision_prompt() -> String {
    r#"You are a code improvement analyst. Analyze this codebase to find opportunities for improvement.

IMPORTANT: This is a READ-ONLY analysis. DO NOT make any changes. Only identify and report improvements.

Focus on these categories:
1. **Code Quality**: Refactoring opportunities, code smells, complexity issues
2. **Missing Tests**: Functions/modules without adequate test coverage
3. **Documentation Gaps**: Missing docstrings, unclear code, outdated comments
4. **Potential Bugs**: Error handling issues, edge cases, security concerns

For each improvement you identify:
- Keep it small and focused (max 10 minutes of work)
- Be specific about the file and location
- Explain WHY it's an improvement
- Estimate time to implement

Start by exploring the codebase structure using Glob, then Read key files to understand the code.

Output your findings in this exact format (one improvement per block):

---IMPROVEMENT---
CATEGORY: <one of: code_quality, missing_tests, documentation_gaps, potential_bugs>
TITLE: <short descriptive title>
FILE: <file path or "N/A" if general>
PRIORITY: <low, medium, or high>
TIME_ESTIMATE: <number of minutes>
DESCRIPTION: <detailed description of the improvement>
---END---

Find 3-5 high-value improvements. Focus on practical, actionable items."#
        .to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Category,
    Title,
    File,
    Priority,
    TimeEstimate,
    Description,
}

const FIELD_PREFIXES: [(&str, Field); 6] = [
    ("CATEGORY:", Field::Category),
    ("TITLE:", Field::Title),
    ("FILE:", Field::File),
    ("PRIORITY:", Field::Priority),
    ("TIME_ESTIMATE:", Field::TimeEstimate),
    ("DESCRIPTION:", Field::Description),
];

#[derive(Debug, Default)]
struct BlockFields {
    category: Option<String>,
    title: Option<String>,
    file: Option<String>,
    priority: Option<String>,
    time_estimate: Option<String>,
    description: Option<String>,
}

impl BlockFields {
    fn set(&mut self, field: Field, lines: &[&str]) {
        let value = Some(lines.join("\n").trim().to_string());
        match field {
            Field::Category => self.category = value,
            Field::Title => self.title = value,
            Field::File => self.file = value,
            Field::Priority => self.priority = value,
            Field::TimeEstimate => self.time_estimate = value,
            Field::Description => self.description = value,
        }
    }

    fn parse(block: &str) -> Self {
        let mut fields = BlockFields::default();
        let mut current: Option<Field> = None;
        let mut value: Vec<&str> = Vec::new();

        for line in block.lines() {
            let started = FIELD_PREFIXES
                .iter()
                .find_map(|(prefix, field)| line.strip_prefix(prefix).map(|rest| (*field, rest)));

            match started {
                Some((field, rest)) => {
                    if let Some(prev) = current {
                        fields.set(prev, &value);
                    }
                    current = Some(field);
                    value = vec![rest.trim()];
                }
                None => value.push(line),
            }
        }

        if let Some(prev) = current {
            fields.set(prev, &value);
        }
        fields
    }

    fn into_improvement(self) -> Option<Improvement> {
        let category = self.category?;
        let title = self.title?;
        let description = self.description?;

        let file_path = self
            .file
            .filter(|f| !f.eq_ignore_ascii_case("N/A"));

        Some(Improvement {
            category: category.to_lowercase().replace(' ', "_"),
            title,
            description,
            file_path,
            estimated_time_minutes: parse_minutes(self.time_estimate.as_deref()),
            priority: self
                .priority
                .unwrap_or_else(|| "medium".to_string())
                .to_lowercase(),
        })
    }
}

/// Digits of the estimate as minutes, defaulting to and capped at 10.
fn parse_minutes(raw: Option<&str>) -> u32 {
    let digits: String = raw
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    digits
        .parse::<u32>()
        .unwrap_or(MAX_ESTIMATE_MINUTES)
        .min(MAX_ESTIMATE_MINUTES)
}

/// Extract improvement blocks from an agent response.
///
/// Text before the first marker and blocks without a closing marker are
/// ignored, as are blocks missing a category, title or description.
pub fn parse_improvements(text: &str) -> Vec<Improvement> {
    text.split(BLOCK_START)
        .skip(1)
        .filter_map(|block| {
            let (content, _) = block.split_once(BLOCK_END)?;
            BlockFields::parse(content.trim()).into_improvement()
        })
        .collect()
}

/// Run the analysis and collect the filtered, sorted improvements.
///
/// The agent stream is abandoned once `max_time` has passed; whatever text
/// arrived by then is still parsed.
pub async fn analyze_codebase(
    backend: &dyn AgentBackend,
    options: &EnvisionOptions,
) -> Result<EnvisionResult> {
    let started = Instant::now();
    let deadline = started + options.max_time;

    info!(
        max_agents = options.max_agents,
        max_time = ?options.max_time,
        category = %options.category,
        "starting envision analysis"
    );

    let request = QueryRequest::new(build_envision_prompt(), &options.tools)
        .with_max_turns(options.max_turns)
        .with_cwd(&options.cwd);
    let mut stream = backend.query(request).await?;

    let mut acc = ResponseAccumulator::new();
    loop {
        match tokio::time::timeout_at(deadline, stream.recv()).await {
            Ok(Some(item)) => acc.push(&item?),
            Ok(None) => break,
            Err(_) => {
                warn!("envision time limit reached; using the response so far");
                break;
            }
        }
    }
    drop(stream);

    let mut improvements: Vec<Improvement> = parse_improvements(acc.text())
        .into_iter()
        .filter(|imp| options.category.matches(&imp.category))
        .collect();
    improvements.sort_by_key(Improvement::priority_rank);

    let elapsed = started.elapsed().as_secs_f64();
    debug!(found = improvements.len(), elapsed, "envision analysis finished");

    Ok(EnvisionResult {
        improvements,
        analysis_time_seconds: (elapsed * 100.0).round() / 100.0,
        files_analyzed: acc.files_touched().max(1),
        max_agents: options.max_agents,
    })
}

fn title_case(category: &str) -> String {
    category
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn format_text(result: &EnvisionResult) -> String {
    let heavy = "=".repeat(60);
    let light = "-".repeat(60);

    let mut lines = vec![
        String::new(),
        heavy.clone(),
        "  CODEBASE IMPROVEMENT PROPOSALS".to_string(),
        heavy.clone(),
        String::new(),
        format!("Analysis completed in {:.1}s", result.analysis_time_seconds),
        format!("Files analyzed: {}", result.files_analyzed),
        format!("Improvements found: {}", result.improvements.len()),
        String::new(),
    ];

    if result.improvements.is_empty() {
        lines.push("No improvements identified. The codebase looks good!".to_string());
    }

    for (i, imp) in result.improvements.iter().enumerate() {
        let icon = match imp.priority.as_str() {
            "high" => "[!]",
            "low" => "[-]",
            _ => "[*]",
        };
        lines.push(light.clone());
        lines.push(format!("{icon} {}. {}", i + 1, imp.title));
        lines.push(format!("   Category: {}", title_case(&imp.category)));
        lines.push(format!("   Priority: {}", imp.priority.to_uppercase()));
        lines.push(format!("   Estimated time: ~{} min", imp.estimated_time_minutes));
        if let Some(file) = &imp.file_path {
            lines.push(format!("   File: {file}"));
        }
        lines.push(String::new());
        lines.push(format!("   {}", imp.description));
        lines.push(String::new());
    }

    lines.push(heavy.clone());
    lines.push("NOTE: These are proposals only. No changes have been made.".to_string());
    lines.push(heavy);
    lines.push(String::new());

    lines.join("\n")
}

#[derive(Serialize)]
struct JsonReport<'a> {
    analysis_time_seconds: f64,
    files_analyzed: usize,
    improvements_count: usize,
    improvements: &'a [Improvement],
}

pub fn format_json(result: &EnvisionResult) -> Result<String> {
    let report = JsonReport {
        analysis_time_seconds: result.analysis_time_seconds,
        files_analyzed: result.files_analyzed,
        improvements_count: result.improvements.len(),
        improvements: &result.improvements,
    };
    Ok(serde_json::to_string_pretty(&report).map_err(anyhow::Error::from)?)
}
