// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::{DeletionScope, SignalSpec};

/// Configuration exactly as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// watch_interval = "5s"
/// deletion_scope = "watch"
///
/// [[job]]
/// name = "web"
/// command = "/usr/sbin/nginx"
/// args = ["-g", "daemon off;"]
///
/// [[job.watch]]
/// pattern = "/etc/nginx/conf.d/*.conf"
/// signal = "SIGHUP"
/// pre_command = { command = "nginx", args = ["-t"] }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// All jobs from `[[job]]`, in file order.
    #[serde(default)]
    pub job: Vec<JobConfig>,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    jobs: Vec<JobConfig>,
    watch_interval: Duration,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        jobs: Vec<JobConfig>,
        watch_interval: Duration,
    ) -> Self {
        Self {
            config,
            jobs,
            watch_interval,
        }
    }

    pub fn settings(&self) -> &ConfigSection {
        &self.config
    }

    pub fn jobs(&self) -> &[JobConfig] {
        &self.jobs
    }

    /// Parsed `[config].watch_interval`.
    pub fn watch_interval(&self) -> Duration {
        self.watch_interval
    }

    pub fn deletion_scope(&self) -> DeletionScope {
        self.config.deletion_scope
    }

    /// Replace the polling interval (used for the `--watch-interval` flag).
    pub fn set_watch_interval(&mut self, interval: Duration) {
        self.watch_interval = interval;
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// How often watch patterns are polled, e.g. `"5s"` or `"500ms"`.
    #[serde(default = "default_watch_interval")]
    pub watch_interval: String,

    /// `"watch"` (default) or `"all"`.
    #[serde(default)]
    pub deletion_scope: DeletionScope,
}

fn default_watch_interval() -> String {
    "5s".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            watch_interval: default_watch_interval(),
            deletion_scope: DeletionScope::default(),
        }
    }
}

/// `[[job]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    pub name: String,

    /// Program to execute (looked up in `PATH` if not absolute).
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Extra `KEY=VALUE` entries appended to the inherited environment.
    #[serde(default)]
    pub env: Vec<String>,

    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Values <= 0 fall back to the default of 3.
    #[serde(default)]
    pub max_attempts: i64,

    /// Exhausting all attempts is not an error for this job.
    #[serde(default)]
    pub can_fail: bool,

    /// The job is done after its first clean exit.
    #[serde(default)]
    pub one_time: bool,

    #[serde(default, rename = "watch")]
    pub watches: Vec<WatchConfig>,
}

/// `[[job.watch]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    pub pattern: String,

    /// Mark the job for restart when a matched file drifts.
    #[serde(default)]
    pub restart: bool,

    #[serde(default)]
    pub signal: Option<SignalSpec>,

    #[serde(default)]
    pub pre_command: Option<HookConfig>,

    #[serde(default)]
    pub post_command: Option<HookConfig>,
}

/// A hook command run around signal delivery.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookConfig {
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub env: Vec<String>,
}
