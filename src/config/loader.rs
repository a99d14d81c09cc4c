// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, WatchfixError};

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; semantic checks happen in
/// `ConfigFile::try_from`. Use [`load_and_validate`] for both.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Where the raw configuration came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub raw: RawConfigFile,
    /// `None` when no file was found and defaults are in use.
    pub source: Option<PathBuf>,
}

/// Load the raw config for a run.
///
/// An explicitly requested file must exist. Without one, the default path is
/// used when present and built-in defaults otherwise.
pub fn load_raw_or_default(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(WatchfixError::ConfigError(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return Ok(LoadedConfig {
            raw: load_from_path(path)?,
            source: Some(path.to_path_buf()),
        });
    }

    let default_path = default_config_path();
    if default_path.is_file() {
        debug!(path = ?default_path, "using default config file");
        return Ok(LoadedConfig {
            raw: load_from_path(&default_path)?,
            source: Some(default_path),
        });
    }

    debug!("no config file found; using built-in defaults");
    Ok(LoadedConfig {
        raw: RawConfigFile::default(),
        source: None,
    })
}

/// Default config path: `Watchfix.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Watchfix.toml")
}
