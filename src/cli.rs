// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::loader::default_config_path;

/// Command-line arguments for `warden`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "warden",
    version,
    about = "Keep processes alive and reload them when their files change.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WARDEN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Override `[config].watch_interval`, e.g. `500ms` or `10s`.
    #[arg(long, value_name = "DURATION", value_parser = parse_interval)]
    pub watch_interval: Option<std::time::Duration>,

    /// Parse + validate, print the jobs, but don't start anything.
    #[arg(long)]
    pub dry_run: bool,
}

fn parse_interval(s: &str) -> Result<std::time::Duration, String> {
    let interval = crate::types::parse_duration(s)?;
    if interval.is_zero() {
        return Err("watch interval must be greater than zero".to_string());
    }
    Ok(interval)
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
