// src/engine/supervisor.rs

use std::fmt;

use tracing::{error, info, warn};

use crate::config::JobConfig;
use crate::engine::core::{Decision, RetryPolicy, RetryTracker};
use crate::engine::{is_cancelled, AttemptOutcome, CancelRx, JobName};
use crate::errors::{Result, WardenError};
use crate::exec::AttemptRunner;

/// Keeps one job alive according to its retry policy.
///
/// This is the async shell around [`RetryTracker`]: it runs attempts through
/// an [`AttemptRunner`], logs every outcome, and turns the tracker's
/// decisions into loop control.
pub struct JobSupervisor<R: AttemptRunner> {
    name: JobName,
    tracker: RetryTracker,
    runner: R,
}

impl<R: AttemptRunner> fmt::Debug for JobSupervisor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobSupervisor")
            .field("name", &self.name)
            .field("tracker", &self.tracker)
            .finish_non_exhaustive()
    }
}

impl<R: AttemptRunner> JobSupervisor<R> {
    pub fn new(name: impl Into<JobName>, policy: RetryPolicy, runner: R) -> Self {
        Self {
            name: name.into(),
            tracker: RetryTracker::new(policy),
            runner,
        }
    }

    pub fn for_job(job: &JobConfig, runner: R) -> Self {
        Self::new(job.name.clone(), RetryPolicy::from_job(job), runner)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attempts counted against `max_attempts` so far.
    pub fn attempts(&self) -> u32 {
        self.tracker.attempts()
    }

    /// Run attempts until the job finishes, gives up, is cancelled, or runs
    /// out of attempts.
    ///
    /// Only the last case is an error.
    pub async fn run(&mut self, cancel: CancelRx) -> Result<()> {
        let name = self.name.clone();

        loop {
            if is_cancelled(&cancel) {
                info!(job = %name, "job cancelled; not starting another attempt");
                return Ok(());
            }

            let outcome = self.runner.run_attempt(cancel.clone()).await;

            if is_cancelled(&cancel) {
                info!(job = %name, "job stopped after cancellation");
                return Ok(());
            }

            match &outcome {
                AttemptOutcome::Clean if self.tracker.policy().one_time => {
                    info!(job = %name, "one-time job has ended successfully");
                }
                AttemptOutcome::Clean => warn!(job = %name, "job exited without errors"),
                AttemptOutcome::RestartRequested => info!(job = %name, "restart process"),
                AttemptOutcome::Failed(err) => {
                    error!(job = %name, error = %format!("{err:#}"), "job exited with error")
                }
            }

            match self.tracker.record(&outcome) {
                Decision::Restart => continue,
                Decision::Finished => return Ok(()),
                Decision::Retry { used, max } => {
                    info!(
                        job = %name,
                        job.max_attempts = max,
                        job.used_attempts = used,
                        "remaining attempts"
                    );
                }
                Decision::GaveUp { max } => {
                    warn!(job = %name, job.max_attempts = max, "reached max retries");
                    return Ok(());
                }
                Decision::Exhausted { attempts } => {
                    return Err(WardenError::MaxAttemptsReached {
                        job: name,
                        attempts,
                    });
                }
            }
        }
    }
}
