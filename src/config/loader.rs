// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a profile from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization. Use [`load_and_validate`] for
/// semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a profile from path and validate it.
///
/// - Reads TOML.
/// - Applies `[simulation]` defaults (handled by `serde` + `Default` impls).
/// - Checks node assignments, exec times, the bandwidth matrix, simulation
///   parameters and acyclicity of the task graph.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Profile path used when `--config` is not given.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Flowsim.toml")
}
