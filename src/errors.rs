// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WardenError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid signal: {0}")]
    InvalidSignal(String),

    /// A job ran out of attempts and is not allowed to fail.
    #[error("reached max retries for job {job}: {attempts} attempts exhausted")]
    MaxAttemptsReached { job: String, attempts: u32 },

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, WardenError>;
