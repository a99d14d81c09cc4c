// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::watch::ignore::{IgnoreRules, DEFAULT_IGNORE_NAMES, DEFAULT_IGNORE_SUFFIXES};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [watch]
/// settle_secs = 2.0
/// poll_interval_secs = 0.5
/// exclude = ["**/*.lock"]
///
/// [agent]
/// command = "claude"
///
/// [envision]
/// max_turns = 20
/// ```
///
/// All sections are optional and have reasonable defaults. This is the
/// unvalidated form; convert it with `ConfigFile::try_from`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub agent: AgentSection,

    #[serde(default)]
    pub envision: EnvisionSection,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Directory to watch. Relative paths are resolved against the directory
    /// holding the config file.
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// How long a path must be quiet before it is analyzed.
    #[serde(default = "default_settle_secs")]
    pub settle_secs: f64,

    /// How often the monitor polls the debouncer.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: f64,

    /// Path segments that cause a path to be ignored (exact match).
    #[serde(default = "default_ignore_names")]
    pub ignore_names: Vec<String>,

    /// Path suffixes that cause a path to be ignored.
    #[serde(default = "default_ignore_suffixes")]
    pub ignore_suffixes: Vec<String>,

    /// Extra root-relative glob patterns to ignore.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Skip files whose content hash matches the last analyzed version.
    #[serde(default)]
    pub skip_unchanged: bool,
}

fn default_settle_secs() -> f64 {
    2.0
}

fn default_poll_interval_secs() -> f64 {
    0.5
}

fn default_ignore_names() -> Vec<String> {
    DEFAULT_IGNORE_NAMES.iter().map(|s| s.to_string()).collect()
}

fn default_ignore_suffixes() -> Vec<String> {
    DEFAULT_IGNORE_SUFFIXES.iter().map(|s| s.to_string()).collect()
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            root: None,
            settle_secs: default_settle_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            ignore_names: default_ignore_names(),
            ignore_suffixes: default_ignore_suffixes(),
            exclude: Vec::new(),
            skip_unchanged: false,
        }
    }
}

/// `[agent]` section: how to reach the analysis agent CLI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentSection {
    #[serde(default = "default_agent_command")]
    pub command: String,

    /// Appended verbatim after the generated arguments.
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Tools the agent may use while analyzing (read-only).
    #[serde(default = "default_analysis_tools")]
    pub analysis_tools: Vec<String>,

    /// Tools the agent may use once the user approved fixes.
    #[serde(default = "default_fix_tools")]
    pub fix_tools: Vec<String>,
}

fn default_agent_command() -> String {
    "claude".to_string()
}

fn default_analysis_tools() -> Vec<String> {
    ["Read", "Glob", "Grep"].iter().map(|s| s.to_string()).collect()
}

fn default_fix_tools() -> Vec<String> {
    ["Read", "Edit", "Write", "Glob", "Grep"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            command: default_agent_command(),
            extra_args: Vec::new(),
            analysis_tools: default_analysis_tools(),
            fix_tools: default_fix_tools(),
        }
    }
}

/// `[envision]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnvisionSection {
    /// Conversation turn limit handed to the agent.
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    #[serde(default = "default_analysis_tools")]
    pub read_only_tools: Vec<String>,
}

fn default_max_turns() -> u32 {
    20
}

impl Default for EnvisionSection {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            read_only_tools: default_analysis_tools(),
        }
    }
}

/// Validated `[watch]` settings with durations resolved.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub root: Option<PathBuf>,
    pub settle_window: Duration,
    pub poll_interval: Duration,
    pub ignore_names: Vec<String>,
    pub ignore_suffixes: Vec<String>,
    pub exclude: Vec<String>,
    pub skip_unchanged: bool,
}

impl WatchConfig {
    /// Compile the ignore rules. Globs were already checked during
    /// validation, so this only fails for hand-built configs.
    pub fn ignore_rules(&self) -> anyhow::Result<IgnoreRules> {
        IgnoreRules::new(
            self.ignore_names.iter().cloned(),
            self.ignore_suffixes.iter().cloned(),
            &self.exclude,
        )
    }
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    watch: WatchConfig,
    agent: AgentSection,
    envision: EnvisionSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        watch: WatchConfig,
        agent: AgentSection,
        envision: EnvisionSection,
    ) -> Self {
        Self {
            watch,
            agent,
            envision,
        }
    }

    pub fn watch(&self) -> &WatchConfig {
        &self.watch
    }

    pub fn agent(&self) -> &AgentSection {
        &self.agent
    }

    pub fn envision(&self) -> &EnvisionSection {
        &self.envision
    }
}
