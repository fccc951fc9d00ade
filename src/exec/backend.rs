// src/exec/backend.rs

//! Pluggable process capabilities.
//!
//! The supervisor and the watch reconciler never touch processes directly:
//!
//! - [`AttemptRunner`] runs one attempt of a job and classifies how it ended.
//! - [`ProcessControl`] delivers signals to the running attempt and sets the
//!   cooperative restart flag.
//!
//! Production code uses [`ManagedProcess`](crate::exec::ManagedProcess),
//! which implements both. Tests can provide scripted implementations that
//! don't spawn real processes.

use std::future::Future;
use std::pin::Pin;

use nix::sys::signal::Signal;

use crate::engine::{AttemptOutcome, CancelRx};

/// Trait abstracting how a single attempt is executed.
pub trait AttemptRunner: Send {
    /// Start the process, wait for it to end, and report the outcome.
    ///
    /// `cancel` flips to `true` when the supervisor is shutting down. The
    /// implementation decides whether to stop an attempt that is already
    /// running.
    fn run_attempt(
        &mut self,
        cancel: CancelRx,
    ) -> Pin<Box<dyn Future<Output = AttemptOutcome> + Send + '_>>;
}

/// Control over the currently running attempt of a job.
pub trait ProcessControl: Send + Sync {
    /// Deliver `signal` to the running process, if any.
    fn signal(&self, signal: Signal);

    /// Make the current attempt end as [`AttemptOutcome::RestartRequested`]
    /// once its process exits.
    fn mark_for_restart(&self);
}
