// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{ConfigFile, RawConfigFile, WatchConfig};
use crate::errors::{Result, WatchfixError};
use crate::watch::ignore::build_globset;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::WatchfixError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let (settle_window, poll_interval) = validate_timing(&raw)?;
        validate_ignore_rules(&raw)?;
        validate_agent(&raw)?;

        let RawConfigFile {
            watch,
            agent,
            envision,
        } = raw;

        let watch = WatchConfig {
            root: watch.root,
            settle_window,
            poll_interval,
            ignore_names: watch.ignore_names,
            ignore_suffixes: watch.ignore_suffixes,
            exclude: watch.exclude,
            skip_unchanged: watch.skip_unchanged,
        };

        Ok(ConfigFile::new_unchecked(watch, agent, envision))
    }
}

/// Check the timing keys and convert them to durations.
fn validate_timing(cfg: &RawConfigFile) -> Result<(Duration, Duration)> {
    let settle = cfg.watch.settle_secs;
    if !settle.is_finite() || settle < 0.0 {
        return Err(WatchfixError::ConfigError(format!(
            "[watch].settle_secs must be a finite number >= 0 (got {settle})"
        )));
    }

    let poll = cfg.watch.poll_interval_secs;
    if !poll.is_finite() || poll <= 0.0 {
        return Err(WatchfixError::ConfigError(format!(
            "[watch].poll_interval_secs must be a finite number > 0 (got {poll})"
        )));
    }

    Ok((
        secs_to_duration("settle_secs", settle)?,
        secs_to_duration("poll_interval_secs", poll)?,
    ))
}

fn secs_to_duration(key: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|err| {
        WatchfixError::ConfigError(format!("[watch].{key} is out of range (got {secs}): {err}"))
    })
}

fn validate_ignore_rules(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.ignore_names.iter().any(|n| n.trim().is_empty()) {
        return Err(WatchfixError::ConfigError(
            "[watch].ignore_names must not contain empty entries".to_string(),
        ));
    }

    // An empty suffix matches every path.
    if cfg.watch.ignore_suffixes.iter().any(|s| s.is_empty()) {
        return Err(WatchfixError::ConfigError(
            "[watch].ignore_suffixes must not contain empty entries".to_string(),
        ));
    }

    build_globset(&cfg.watch.exclude).map_err(|err| {
        WatchfixError::ConfigError(format!("[watch].exclude contains an invalid glob: {err}"))
    })?;

    Ok(())
}

fn validate_agent(cfg: &RawConfigFile) -> Result<()> {
    if cfg.agent.command.trim().is_empty() {
        return Err(WatchfixError::ConfigError(
            "[agent].command must not be empty".to_string(),
        ));
    }

    if cfg.envision.max_turns == 0 {
        return Err(WatchfixError::ConfigError(
            "[envision].max_turns must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}
