#![allow(dead_code)]

use std::path::PathBuf;

use warden::config::{ConfigFile, ConfigSection, HookConfig, JobConfig, RawConfigFile, WatchConfig};
use warden::types::{DeletionScope, SignalSpec};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                job: Vec::new(),
            },
        }
    }

    pub fn with_job(mut self, job: JobConfig) -> Self {
        self.config.job.push(job);
        self
    }

    pub fn watch_interval(mut self, interval: &str) -> Self {
        self.config.config.watch_interval = interval.to_string();
        self
    }

    pub fn deletion_scope(mut self, scope: DeletionScope) -> Self {
        self.config.config.deletion_scope = scope;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobConfig`.
pub struct JobConfigBuilder {
    job: JobConfig,
}

impl JobConfigBuilder {
    pub fn new(name: &str, command: &str) -> Self {
        Self {
            job: JobConfig {
                name: name.to_string(),
                command: command.to_string(),
                args: vec![],
                env: vec![],
                working_dir: None,
                max_attempts: 0,
                can_fail: false,
                one_time: false,
                watches: vec![],
            },
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.job.args.push(arg.to_string());
        self
    }

    pub fn env(mut self, entry: &str) -> Self {
        self.job.env.push(entry.to_string());
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.job.working_dir = Some(dir.into());
        self
    }

    pub fn max_attempts(mut self, n: i64) -> Self {
        self.job.max_attempts = n;
        self
    }

    pub fn can_fail(mut self, val: bool) -> Self {
        self.job.can_fail = val;
        self
    }

    pub fn one_time(mut self, val: bool) -> Self {
        self.job.one_time = val;
        self
    }

    pub fn watch(mut self, watch: WatchConfig) -> Self {
        self.job.watches.push(watch);
        self
    }

    pub fn build(self) -> JobConfig {
        self.job
    }
}

/// Builder for `WatchConfig`.
pub struct WatchConfigBuilder {
    watch: WatchConfig,
}

impl WatchConfigBuilder {
    pub fn new(pattern: &str) -> Self {
        Self {
            watch: WatchConfig {
                pattern: pattern.to_string(),
                restart: false,
                signal: None,
                pre_command: None,
                post_command: None,
            },
        }
    }

    pub fn restart(mut self, val: bool) -> Self {
        self.watch.restart = val;
        self
    }

    pub fn signal(mut self, signal: i32) -> Self {
        self.watch.signal = Some(SignalSpec::Number(signal));
        self
    }

    pub fn signal_name(mut self, name: &str) -> Self {
        self.watch.signal = Some(SignalSpec::Name(name.to_string()));
        self
    }

    pub fn pre_command(mut self, command: &str) -> Self {
        self.watch.pre_command = Some(hook(command));
        self
    }

    pub fn post_command(mut self, command: &str) -> Self {
        self.watch.post_command = Some(hook(command));
        self
    }

    pub fn build(self) -> WatchConfig {
        self.watch
    }
}

/// A hook without args or env.
pub fn hook(command: &str) -> HookConfig {
    HookConfig {
        command: command.to_string(),
        args: vec![],
        env: vec![],
    }
}
