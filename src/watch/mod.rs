// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Expanding watch glob patterns into existing paths (`patterns`).
//! - Keeping the per-job record of modification times and diffing it
//!   against fresh observations (`state`).
//! - Running one reconciliation pass per tick and reacting to drift with
//!   hooks, restart marks and signals (`reconciler`, `hooks`).
//!
//! Watching is polling based; there is no filesystem event notifier.

pub mod hooks;
pub mod patterns;
pub mod reconciler;
pub mod state;

pub use hooks::{HookRunner, ProcessHookRunner};
pub use patterns::{expand, WatchPattern};
pub use reconciler::{WatchReconciler, WatchRule};
pub use state::{Drift, Probe, WatchState};
