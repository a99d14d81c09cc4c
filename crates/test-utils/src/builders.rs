#![allow(dead_code)]

use watchfix::config::{ConfigFile, RawConfigFile};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the same defaults an empty `Watchfix.toml` would give.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn settle_secs(mut self, secs: f64) -> Self {
        self.config.watch.settle_secs = secs;
        self
    }

    pub fn poll_interval_secs(mut self, secs: f64) -> Self {
        self.config.watch.poll_interval_secs = secs;
        self
    }

    pub fn with_exclude(mut self, pattern: &str) -> Self {
        self.config.watch.exclude.push(pattern.to_string());
        self
    }

    pub fn with_ignore_name(mut self, name: &str) -> Self {
        self.config.watch.ignore_names.push(name.to_string());
        self
    }

    pub fn skip_unchanged(mut self, val: bool) -> Self {
        self.config.watch.skip_unchanged = val;
        self
    }

    pub fn agent_command(mut self, command: &str) -> Self {
        self.config.agent.command = command.to_string();
        self
    }

    pub fn max_turns(mut self, turns: u32) -> Self {
        self.config.envision.max_turns = turns;
        self
    }

    /// The raw form, for tests that exercise validation themselves.
    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
