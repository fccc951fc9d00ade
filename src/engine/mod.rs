// src/engine/mod.rs

//! Supervision engine for warden.
//!
//! This module ties together:
//! - the pure retry state machine ([`core`])
//! - the per-job retry loop that drives attempts ([`supervisor`])
//! - the runtime that launches every job with its watch ticker and reacts to
//!   shutdown ([`runtime`])

use tokio::sync::watch;

/// Canonical job name type used throughout the engine.
pub type JobName = String;

/// Receiving side of the cancellation flag. `true` means "stop".
pub type CancelRx = watch::Receiver<bool>;

/// Result of a single attempt to run a job's process.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// The process exited successfully.
    Clean,
    /// The process exited because a restart was requested (e.g. a watched
    /// file changed). Does not count as a failed attempt.
    RestartRequested,
    /// The process could not be started or exited unsuccessfully.
    Failed(anyhow::Error),
}

impl AttemptOutcome {
    pub fn failed(msg: impl Into<String>) -> Self {
        AttemptOutcome::Failed(anyhow::anyhow!(msg.into()))
    }
}

/// Create a fresh, un-cancelled cancellation channel.
pub fn cancel_channel() -> (watch::Sender<bool>, CancelRx) {
    watch::channel(false)
}

pub fn is_cancelled(cancel: &CancelRx) -> bool {
    *cancel.borrow()
}

/// Resolve once cancellation has been requested.
///
/// If the sending side is dropped without cancelling, this never resolves.
pub async fn cancelled(cancel: &mut CancelRx) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

pub mod core;
pub mod runtime;
pub mod supervisor;

pub use self::core::{Decision, RetryPolicy, RetryTracker, DEFAULT_MAX_ATTEMPTS};
pub use self::runtime::Runtime;
pub use self::supervisor::JobSupervisor;
