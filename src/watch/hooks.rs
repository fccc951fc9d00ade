// src/watch/hooks.rs

//! Pre/post commands run around signal delivery when a watch drifts.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{anyhow, bail, Context, Result};
use tokio::process::Command;
use tracing::info;

use crate::config::HookConfig;
use crate::exec::env::child_env;

/// Runs hook commands to completion.
///
/// Production code uses [`ProcessHookRunner`]; tests can record the calls
/// instead of spawning processes.
pub trait HookRunner: Send + Sync {
    /// Run `hook` for `job`. Success means the command exited with status 0.
    fn run<'a>(
        &'a self,
        job: &'a str,
        hook: &'a HookConfig,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Spawns hooks as child processes with inherited stdout/stderr.
#[derive(Debug, Clone, Default)]
pub struct ProcessHookRunner;

impl HookRunner for ProcessHookRunner {
    fn run<'a>(
        &'a self,
        job: &'a str,
        hook: &'a HookConfig,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if hook.command.is_empty() {
                bail!("command is missing");
            }

            info!(job = %job, command = %hook.command, "executing watch command");

            let status = Command::new(&hook.command)
                .args(&hook.args)
                .env_clear()
                .envs(child_env(&hook.env))
                .stdin(Stdio::null())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .await
                .with_context(|| format!("spawning watch command '{}'", hook.command))?;

            if !status.success() {
                return Err(anyhow!(
                    "watch command '{}' exited with {}",
                    hook.command,
                    status
                ));
            }
            Ok(())
        })
    }
}
