// src/exec/process.rs

//! Production process backend.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::config::JobConfig;
use crate::engine::{cancelled, AttemptOutcome, CancelRx};
use crate::exec::backend::{AttemptRunner, ProcessControl};
use crate::exec::env::child_env;

/// How long a cancelled process gets between SIGTERM and SIGKILL.
pub const STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// What to execute for a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub command: String,
    pub args: Vec<String>,
    pub env: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl ProcessSpec {
    pub fn from_job(job: &JobConfig) -> Self {
        Self {
            command: job.command.clone(),
            args: job.args.clone(),
            env: job.env.clone(),
            working_dir: job.working_dir.clone(),
        }
    }
}

#[derive(Debug)]
struct Inner {
    job: String,
    spec: ProcessSpec,
    pid: Mutex<Option<i32>>,
    restart: AtomicBool,
}

/// A job's child process.
///
/// Clones share the same state: the supervisor drives attempts through one
/// clone while the watch reconciler signals through another.
#[derive(Debug, Clone)]
pub struct ManagedProcess {
    inner: Arc<Inner>,
}

impl ManagedProcess {
    pub fn new(job: impl Into<String>, spec: ProcessSpec) -> Self {
        Self {
            inner: Arc::new(Inner {
                job: job.into(),
                spec,
                pid: Mutex::new(None),
                restart: AtomicBool::new(false),
            }),
        }
    }

    pub fn from_job(job: &JobConfig) -> Self {
        Self::new(job.name.clone(), ProcessSpec::from_job(job))
    }

    /// Pid of the running attempt, if one is running.
    pub fn pid(&self) -> Option<i32> {
        *self.inner.pid.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_pid(&self, pid: Option<i32>) {
        *self.inner.pid.lock().unwrap_or_else(PoisonError::into_inner) = pid;
    }

    fn spawn(&self) -> Result<Child> {
        let spec = &self.inner.spec;
        let mut cmd = Command::new(&spec.command);
        cmd.args(&spec.args)
            .env_clear()
            .envs(child_env(&spec.env))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        if let Some(dir) = &spec.working_dir {
            cmd.current_dir(dir);
        }

        cmd.spawn()
            .with_context(|| format!("spawning process for job '{}'", self.inner.job))
    }

    async fn attempt(&self, mut cancel: CancelRx) -> AttemptOutcome {
        let mut child = match self.spawn() {
            Ok(child) => child,
            Err(err) => return AttemptOutcome::Failed(err),
        };

        // A mark set while nothing was running must not leak into this attempt.
        self.inner.restart.store(false, Ordering::SeqCst);
        let pid = child.id().and_then(|id| i32::try_from(id).ok());
        self.set_pid(pid);

        info!(
            job = %self.inner.job,
            pid,
            command = %self.inner.spec.command,
            "started process"
        );

        let status = tokio::select! {
            status = child.wait() => status.context("waiting for process"),
            _ = cancelled(&mut cancel) => self.stop(&mut child).await,
        };

        self.set_pid(None);
        let restart = self.inner.restart.swap(false, Ordering::SeqCst);

        match status {
            Err(err) => AttemptOutcome::Failed(err),
            Ok(_) if restart => AttemptOutcome::RestartRequested,
            Ok(status) => classify_exit(status),
        }
    }

    /// SIGTERM the child, then SIGKILL it if it is still alive after
    /// [`STOP_TIMEOUT`].
    async fn stop(&self, child: &mut Child) -> Result<ExitStatus> {
        info!(job = %self.inner.job, "cancellation requested; stopping process");
        self.signal(Signal::SIGTERM);

        match tokio::time::timeout(STOP_TIMEOUT, child.wait()).await {
            Ok(status) => status.context("waiting for process"),
            Err(_) => {
                warn!(job = %self.inner.job, "process ignored SIGTERM; killing it");
                child.kill().await.context("killing process")?;
                child.wait().await.context("waiting for process")
            }
        }
    }
}

fn classify_exit(status: ExitStatus) -> AttemptOutcome {
    if status.success() {
        AttemptOutcome::Clean
    } else {
        AttemptOutcome::Failed(anyhow!("process exited with {status}"))
    }
}

impl AttemptRunner for ManagedProcess {
    fn run_attempt(
        &mut self,
        cancel: CancelRx,
    ) -> Pin<Box<dyn Future<Output = AttemptOutcome> + Send + '_>> {
        Box::pin(self.attempt(cancel))
    }
}

impl ProcessControl for ManagedProcess {
    fn signal(&self, signal: Signal) {
        let Some(pid) = self.pid() else {
            debug!(
                job = %self.inner.job,
                %signal,
                "no running process; signal not delivered"
            );
            return;
        };

        match kill(Pid::from_raw(pid), signal) {
            Ok(()) => info!(job = %self.inner.job, pid, %signal, "signalled process"),
            Err(err) => warn!(
                job = %self.inner.job,
                pid,
                %signal,
                error = %err,
                "failed to signal process"
            ),
        }
    }

    fn mark_for_restart(&self) {
        debug!(job = %self.inner.job, "process marked for restart");
        self.inner.restart.store(true, Ordering::SeqCst);
    }
}
