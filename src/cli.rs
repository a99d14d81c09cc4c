// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::types::{CategoryFilter, OutputFormat};

/// Command-line arguments for `watchfix`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "watchfix",
    version,
    about = "Watch files, have an agent review settled changes, and apply fixes on approval.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Watchfix.toml` in the current working directory, if present.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WATCHFIX_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// What to do. Defaults to `watch`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl CliArgs {
    pub fn command_or_default(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Watch(WatchArgs::default()))
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Watch a directory and analyze files once they settle.
    Watch(WatchArgs),
    /// List pending tasks from TODO.md, PLAN.md and CLAUDE.md.
    Tasks(TasksArgs),
    /// Ask the agent for small improvement proposals (read-only).
    Envision(EnvisionArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct WatchArgs {
    /// Directory to watch (overrides `[watch].root`).
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Quiet period before a changed file is analyzed, in seconds.
    #[arg(long, value_name = "SECS")]
    pub settle_secs: Option<f64>,

    /// How often to check for settled files, in seconds.
    #[arg(long, value_name = "SECS")]
    pub poll_interval_secs: Option<f64>,

    /// Skip files whose content did not change since they were last analyzed.
    #[arg(long)]
    pub skip_unchanged: bool,

    /// Validate the config and print the effective settings, then exit.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Args)]
pub struct TasksArgs {
    /// Directory holding the task files (default: current directory).
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

#[derive(Debug, Clone, Args)]
pub struct EnvisionArgs {
    /// Directory to analyze (overrides `[watch].root`).
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Maximum number of parallel analysis agents.
    #[arg(long, default_value_t = 3)]
    pub max_agents: usize,

    /// Maximum time for the analysis, in seconds.
    #[arg(long, default_value_t = 600)]
    pub max_time: u64,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    #[arg(long, value_enum, default_value_t = CategoryFilter::All)]
    pub category: CategoryFilter,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_watch() {
        let args = CliArgs::try_parse_from(["watchfix"]).unwrap();
        assert!(matches!(args.command_or_default(), Command::Watch(_)));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args = CliArgs::try_parse_from([
            "watchfix",
            "watch",
            "--settle-secs",
            "0.5",
            "--config",
            "cfg.toml",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("cfg.toml")));
        match args.command_or_default() {
            Command::Watch(w) => assert_eq!(w.settle_secs, Some(0.5)),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn envision_category_uses_snake_case() {
        let args =
            CliArgs::try_parse_from(["watchfix", "envision", "--category", "missing_tests", "--output", "json"])
                .unwrap();
        match args.command_or_default() {
            Command::Envision(e) => {
                assert_eq!(e.category, CategoryFilter::MissingTests);
                assert_eq!(e.output, OutputFormat::Json);
                assert_eq!(e.max_agents, 3);
                assert_eq!(e.max_time, 600);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
