// src/engine/workflow.rs

//! The per-batch analysis → approval → fix sequence.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::agent::{collect_response, AgentBackend, AgentMessage, QueryRequest};
use crate::engine::approval::Approver;
use crate::engine::prompt::{build_analysis_prompt, build_fix_prompt};
use crate::engine::{BatchOutcome, Toolset};
use crate::errors::Result;

const FIX_KEYWORDS: [&str; 6] = ["issue", "error", "bug", "fix", "problem", "should"];

pub const APPLY_FIXES_QUESTION: &str = "Would you like me to apply the suggested fixes?";

/// Whether an analysis reads like it found something to fix.
///
/// Plain keyword search, so "no errors found" also counts.
pub fn needs_fixes(analysis: &str) -> bool {
    let lowered = analysis.to_lowercase();
    FIX_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}

fn banner(title: &str) {
    let rule = "=".repeat(60);
    println!("\n{rule}\n{title}\n{rule}");
}

/// Analyze `files`, ask for approval if the analysis suggests fixes, and
/// apply them when approved.
pub async fn analyze_batch(
    backend: &dyn AgentBackend,
    approver: &dyn Approver,
    toolset: &Toolset,
    cwd: &Path,
    files: &[PathBuf],
) -> Result<BatchOutcome> {
    banner("Analyzing changes...");
    info!(files = files.len(), "starting analysis");

    let request = QueryRequest::new(build_analysis_prompt(files), &toolset.analysis).with_cwd(cwd);
    let stream = backend.query(request).await?;
    let response = collect_response(stream, |message| {
        if let AgentMessage::ToolUse(name) = message {
            debug!(tool = %name, "agent tool use during analysis");
        }
    })
    .await?;

    let analysis = response.into_text();
    println!("\n{analysis}");

    if !needs_fixes(&analysis) {
        println!("No issues found, continuing to monitor...");
        return Ok(BatchOutcome::Clean);
    }

    if approver.confirm(APPLY_FIXES_QUESTION).await? {
        apply_fixes(backend, toolset, cwd, files, &analysis).await?;
        Ok(BatchOutcome::FixesApplied)
    } else {
        println!("Skipping fixes, continuing to monitor...");
        Ok(BatchOutcome::FixesDeclined)
    }
}

/// Run the fix query, streaming the agent's text to stdout as it arrives.
pub async fn apply_fixes(
    backend: &dyn AgentBackend,
    toolset: &Toolset,
    cwd: &Path,
    files: &[PathBuf],
    analysis: &str,
) -> Result<()> {
    banner("Applying fixes...");
    info!(files = files.len(), "applying fixes");

    let request = QueryRequest::new(build_fix_prompt(analysis, files), &toolset.fix).with_cwd(cwd);
    let stream = backend.query(request).await?;

    collect_response(stream, |message| match message {
        AgentMessage::Chunk(text) => {
            print!("{text}");
            let _ = std::io::stdout().flush();
        }
        AgentMessage::Final(summary) => println!("\n{summary}"),
        AgentMessage::ToolUse(name) => debug!(tool = %name, "agent tool use during fix"),
    })
    .await?;

    println!("\nFixes applied!");
    Ok(())
}
