// src/config/mod.rs

//! Configuration loading and validation for watchfix.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk, falling back to defaults (`loader.rs`).
//! - Validate timing, ignore rules and agent settings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{
    default_config_path, load_and_validate, load_from_path, load_raw_or_default, LoadedConfig,
};
pub use model::{
    AgentSection, ConfigFile, EnvisionSection, RawConfigFile, WatchConfig, WatchSection,
};
