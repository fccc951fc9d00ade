// src/engine/core.rs

//! Pure retry state machine.
//!
//! [`RetryTracker`] consumes one [`AttemptOutcome`] at a time and says what
//! the supervisor should do next. It has no Tokio types and does not perform
//! any IO, so the retry rules can be tested in isolation:
//!
//! - a clean exit ends a one-time job;
//! - a restart request loops again without consuming an attempt;
//! - any other exit consumes an attempt, and running out of attempts is
//!   either tolerated (`can_fail`) or fatal.

use crate::config::JobConfig;
use crate::engine::AttemptOutcome;

/// Used when `max_attempts` is not configured or not positive.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Retry settings of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: i64,
    pub can_fail: bool,
    pub one_time: bool,
}

impl RetryPolicy {
    pub fn from_job(job: &JobConfig) -> Self {
        Self {
            max_attempts: job.max_attempts,
            can_fail: job.can_fail,
            one_time: job.one_time,
        }
    }

    /// `max_attempts`, with values <= 0 replaced by the default.
    pub fn effective_max_attempts(&self) -> u32 {
        if self.max_attempts <= 0 {
            DEFAULT_MAX_ATTEMPTS
        } else {
            u32::try_from(self.max_attempts).unwrap_or(u32::MAX)
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            can_fail: false,
            one_time: false,
        }
    }
}

/// What the supervisor should do after an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Start the next attempt right away; the attempt counter is unchanged.
    Restart,
    /// The attempt counted; `used` of `max` attempts are spent.
    Retry { used: u32, max: u32 },
    /// A one-time job completed cleanly.
    Finished,
    /// All attempts are spent but the job may fail.
    GaveUp { max: u32 },
    /// All attempts are spent and the job may not fail.
    Exhausted { attempts: u32 },
}

#[derive(Debug, Clone)]
pub struct RetryTracker {
    policy: RetryPolicy,
    max_attempts: u32,
    attempts: u32,
}

impl RetryTracker {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            max_attempts: policy.effective_max_attempts(),
            policy,
            attempts: 0,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Attempts counted against the limit so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn record(&mut self, outcome: &AttemptOutcome) -> Decision {
        match outcome {
            AttemptOutcome::RestartRequested => return Decision::Restart,
            AttemptOutcome::Clean if self.policy.one_time => return Decision::Finished,
            AttemptOutcome::Clean | AttemptOutcome::Failed(_) => {}
        }

        self.attempts = self.attempts.saturating_add(1);
        if self.attempts < self.max_attempts {
            return Decision::Retry {
                used: self.attempts,
                max: self.max_attempts,
            };
        }

        if self.policy.can_fail {
            Decision::GaveUp {
                max: self.max_attempts,
            }
        } else {
            Decision::Exhausted {
                attempts: self.attempts,
            }
        }
    }
}
