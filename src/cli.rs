// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `flowsim`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "flowsim",
    version,
    about = "Estimate workflow latency and per-task service time on a node pool.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the system profile (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Number of completed jobs to simulate (overrides `[simulation].jobs`).
    #[arg(long, value_name = "N")]
    pub jobs: Option<u64>,

    /// Job arrival rate in jobs/second (overrides `[simulation].arrival_rate`).
    #[arg(long, value_name = "RATE")]
    pub arrival_rate: Option<f64>,

    /// Raw arrivals per requested job (overrides `[simulation].arrival_margin`).
    #[arg(long, value_name = "FACTOR")]
    pub arrival_margin: Option<f64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `FLOWSIM_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate the profile and print the node graph without simulating.
    #[arg(long)]
    pub dry_run: bool,
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
