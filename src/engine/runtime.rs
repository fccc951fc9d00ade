// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::config::{ConfigFile, JobConfig};
use crate::engine::supervisor::JobSupervisor;
use crate::engine::{cancelled, CancelRx, JobName};
use crate::errors::{Result, WardenError};
use crate::exec::{ManagedProcess, ProcessControl};
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::DeletionScope;
use crate::watch::{HookRunner, ProcessHookRunner, WatchReconciler};

/// Launches every configured job and waits for them.
///
/// Per job this starts:
/// - a [`JobSupervisor`] driving a [`ManagedProcess`];
/// - if the job has watches, a ticker that runs a [`WatchReconciler`] pass
///   every `watch_interval`. The ticker stops when the supervisor ends.
///
/// Jobs are independent of each other, except that the first job to fail
/// fatally cancels all the others.
pub struct Runtime {
    jobs: Vec<JobConfig>,
    watch_interval: Duration,
    deletion_scope: DeletionScope,
    fs: Arc<dyn FileSystem>,
    hooks: Arc<dyn HookRunner>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("jobs", &self.jobs.len())
            .field("watch_interval", &self.watch_interval)
            .field("deletion_scope", &self.deletion_scope)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(
        jobs: Vec<JobConfig>,
        watch_interval: Duration,
        deletion_scope: DeletionScope,
        fs: Arc<dyn FileSystem>,
        hooks: Arc<dyn HookRunner>,
    ) -> Self {
        Self {
            jobs,
            watch_interval,
            deletion_scope,
            fs,
            hooks,
        }
    }

    /// Runtime for a loaded config, using the real filesystem and real hook
    /// processes.
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self::new(
            cfg.jobs().to_vec(),
            cfg.watch_interval(),
            cfg.deletion_scope(),
            Arc::new(RealFileSystem),
            Arc::new(ProcessHookRunner),
        )
    }

    /// Run all jobs until they end or `cancel_tx` is set.
    ///
    /// Returns the first fatal job error, if any.
    pub async fn run(self, cancel_tx: watch::Sender<bool>) -> Result<()> {
        info!(jobs = self.jobs.len(), "warden runtime started");

        let mut set: JoinSet<(JobName, Result<()>)> = JoinSet::new();

        for job in self.jobs.iter() {
            let process = ManagedProcess::from_job(job);
            let control: Arc<dyn ProcessControl> = Arc::new(process.clone());
            let reconciler = (!job.watches.is_empty()).then(|| {
                WatchReconciler::for_job(
                    job,
                    self.deletion_scope,
                    Arc::clone(&self.fs),
                    control,
                    Arc::clone(&self.hooks),
                )
            });
            let mut supervisor = JobSupervisor::for_job(job, process);
            let cancel = cancel_tx.subscribe();
            let interval = self.watch_interval;
            let name = job.name.clone();

            set.spawn(async move {
                let ticker = reconciler.map(|r| {
                    tokio::spawn(watch_loop(r, interval, cancel.clone()))
                });

                let result = supervisor.run(cancel).await;

                if let Some(ticker) = ticker {
                    ticker.abort();
                }
                (name, result)
            });
        }

        let mut first_error: Option<WardenError> = None;

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((name, Ok(()))) => info!(job = %name, "job finished"),
                Ok((name, Err(err))) => {
                    error!(job = %name, error = %err, "job failed; stopping all jobs");
                    let _ = cancel_tx.send(true);
                    first_error.get_or_insert(err);
                }
                Err(join_err) => {
                    error!(error = %join_err, "job task panicked; stopping all jobs");
                    let _ = cancel_tx.send(true);
                    first_error.get_or_insert(WardenError::Other(join_err.into()));
                }
            }
        }

        info!("runtime exiting");
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Run a reconciliation pass every `interval` until cancelled.
///
/// The first pass happens one interval after start; ticks missed while a pass
/// was still running are skipped.
pub async fn watch_loop(mut reconciler: WatchReconciler, interval: Duration, mut cancel: CancelRx) {
    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => reconciler.pass().await,
            _ = cancelled(&mut cancel) => break,
        }
    }

    debug!("watch loop finished");
}
