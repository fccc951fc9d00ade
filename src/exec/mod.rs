// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running job processes, using
//! `tokio::process::Command`, and for delivering signals to them with `nix`.
//!
//! - [`backend`] defines the `AttemptRunner` and `ProcessControl` traits the
//!   engine and the watcher are written against.
//! - [`process`] provides `ManagedProcess`, the production implementation of
//!   both.
//! - [`env`] builds child environments (inherited + configured entries).

pub mod backend;
pub mod env;
pub mod process;

pub use backend::{AttemptRunner, ProcessControl};
pub use process::{ManagedProcess, ProcessSpec};
