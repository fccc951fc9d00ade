// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{ConfigFile, HookConfig, JobConfig, RawConfigFile, WatchConfig};
use crate::errors::{Result, WardenError};
use crate::types::parse_duration;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::WardenError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let interval = parse_watch_interval(&raw.config.watch_interval)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.job, interval))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_jobs(cfg)?;
    validate_job_names(cfg)?;
    for job in cfg.job.iter() {
        validate_job(job)?;
    }
    Ok(())
}

fn ensure_has_jobs(cfg: &RawConfigFile) -> Result<()> {
    if cfg.job.is_empty() {
        return Err(WardenError::ConfigError(
            "config must contain at least one [[job]] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_job_names(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for job in cfg.job.iter() {
        if job.name.trim().is_empty() {
            return Err(WardenError::ConfigError(
                "every [[job]] needs a non-empty `name`".to_string(),
            ));
        }
        if !seen.insert(job.name.as_str()) {
            return Err(WardenError::ConfigError(format!(
                "duplicate job name '{}'",
                job.name
            )));
        }
    }
    Ok(())
}

fn validate_job(job: &JobConfig) -> Result<()> {
    if job.command.trim().is_empty() {
        return Err(WardenError::ConfigError(format!(
            "job '{}' has an empty `command`",
            job.name
        )));
    }
    validate_env(&job.name, &job.env)?;

    for watch in job.watches.iter() {
        validate_watch(&job.name, watch)?;
    }
    Ok(())
}

fn validate_watch(job: &str, watch: &WatchConfig) -> Result<()> {
    if watch.pattern.trim().is_empty() {
        return Err(WardenError::ConfigError(format!(
            "job '{}' has a watch with an empty `pattern`",
            job
        )));
    }

    if let Some(signal) = &watch.signal {
        signal
            .resolve()
            .map_err(|e| WardenError::InvalidSignal(format!("job '{}': {}", job, e)))?;
    }

    for hook in [&watch.pre_command, &watch.post_command].into_iter().flatten() {
        validate_hook(job, hook)?;
    }
    Ok(())
}

fn validate_hook(job: &str, hook: &HookConfig) -> Result<()> {
    if hook.command.trim().is_empty() {
        return Err(WardenError::ConfigError(format!(
            "job '{}' has a watch command with an empty `command`",
            job
        )));
    }
    validate_env(job, &hook.env)
}

fn validate_env(job: &str, env: &[String]) -> Result<()> {
    if let Some(bad) = env.iter().find(|entry| !entry.contains('=')) {
        return Err(WardenError::ConfigError(format!(
            "job '{}' has env entry '{}' without '='",
            job, bad
        )));
    }
    Ok(())
}

fn parse_watch_interval(raw: &str) -> Result<std::time::Duration> {
    let interval = parse_duration(raw).map_err(|e| {
        WardenError::ConfigError(format!("[config].watch_interval: {e}"))
    })?;
    if interval.is_zero() {
        return Err(WardenError::ConfigError(
            "[config].watch_interval must be greater than zero".to_string(),
        ));
    }
    Ok(interval)
}
