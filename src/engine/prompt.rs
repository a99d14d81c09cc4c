// src/engine/prompt.rs

//! Prompts sent to the agent for each batch.

use std::path::PathBuf;

fn file_list(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|f| format!("  - {}", f.display()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read-only review of freshly settled files.
pub fn build_analysis_prompt(files: &[PathBuf]) -> String {
    format!(
        "The following files were just modified:\n\
         {}\n\
         \n\
         Please:\n\
         1. Read these files to understand the changes\n\
         2. Check for any errors, bugs, or issues (syntax errors, logic errors, security issues, etc.)\n\
         3. If you find issues, describe them clearly and propose fixes\n\
         4. Wait for my approval before making any changes\n\
         \n\
         If everything looks good, just say so.",
        file_list(files)
    )
}

/// Follow-up asking the agent to apply what it proposed in `analysis`.
pub fn build_fix_prompt(analysis: &str, files: &[PathBuf]) -> String {
    format!(
        "Based on your previous analysis:\n\
         {analysis}\n\
         \n\
         Please apply the fixes to these files:\n\
         {}\n\
         \n\
         Make the necessary edits to fix the issues you identified.",
        file_list(files)
    )
}
