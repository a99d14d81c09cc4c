use std::fmt;

use clap::ValueEnum;

/// Kind of filesystem change that reaches the ingestor.
///
/// Everything else the watch backend can report (removals, access, renames
/// away from a path) is dropped before it gets this far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Modified,
    Created,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Modified => f.write_str("modified"),
            ChangeKind::Created => f.write_str("created"),
        }
    }
}

/// Report format for the `tasks` and `envision` subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Category filter for `envision`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum CategoryFilter {
    #[default]
    All,
    CodeQuality,
    MissingTests,
    DocumentationGaps,
    PotentialBugs,
}

impl CategoryFilter {
    /// The category string this filter keeps, `None` for `all`.
    pub fn as_category(&self) -> Option<&'static str> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::CodeQuality => Some("code_quality"),
            CategoryFilter::MissingTests => Some("missing_tests"),
            CategoryFilter::DocumentationGaps => Some("documentation_gaps"),
            CategoryFilter::PotentialBugs => Some("potential_bugs"),
        }
    }

    pub fn matches(&self, category: &str) -> bool {
        self.as_category().is_none_or(|c| c == category)
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_category().unwrap_or("all"))
    }
}
