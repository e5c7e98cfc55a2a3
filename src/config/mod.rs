// src/config/mod.rs

//! Profile loading and validation for flowsim.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a profile file from disk (`loader.rs`).
//! - Validate the static inputs before any actor is built (`validate.rs`).
//! - Convert a validated file into the builder's [`SystemProfile`].

pub mod loader;
pub mod model;
pub mod profile;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    ConfigFile, NetworkSection, NodeConfig, RawConfigFile, SimulationSection, TaskConfig,
};
pub use profile::SystemProfile;
pub use validate::validate_config;
