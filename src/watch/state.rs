// src/watch/state.rs

//! Per-job record of watched paths and their last seen modification time.
//!
//! The diff itself ([`WatchState::reconcile`]) is pure: callers stat the
//! filesystem and hand the results in as [`Probe`]s, so the logic can be
//! tested without touching a real filesystem.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::config::WatchConfig;
use crate::fs::FileSystem;
use crate::watch::patterns::WatchPattern;

/// Result of statting a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Modified(SystemTime),
    /// The path does not exist any more.
    Missing,
    /// Any other stat failure (permissions, races, ...).
    Unreadable,
}

impl Probe {
    pub fn of(fs: &dyn FileSystem, path: &Path) -> Self {
        match fs.modified(path) {
            Ok(mtime) => Probe::Modified(mtime),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Probe::Missing,
            Err(_) => Probe::Unreadable,
        }
    }
}

/// What a single reconciliation found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Drift {
    /// New or modified paths.
    pub changed: Vec<PathBuf>,
    /// Tracked paths that disappeared.
    pub removed: Vec<PathBuf>,
}

impl Drift {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Map of watched path -> last observed modification time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchState {
    files: BTreeMap<PathBuf, SystemTime>,
}

impl WatchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current modification time of every path matched by any of
    /// `watches`.
    ///
    /// Best effort: invalid patterns and unreadable paths are skipped. A path
    /// missed here shows up as "new" on the first pass.
    pub fn initialize(fs: &dyn FileSystem, watches: &[WatchConfig]) -> Self {
        let mut state = Self::new();

        for watch in watches {
            let Ok(pattern) = WatchPattern::new(&watch.pattern) else {
                continue;
            };

            for path in pattern.expand(fs) {
                if let Ok(mtime) = fs.modified(&path) {
                    state.files.insert(path, mtime);
                }
            }
        }

        debug!(tracked = state.files.len(), "initialized watch state");
        state
    }

    pub fn get(&self, path: &Path) -> Option<SystemTime> {
        self.files.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Tracked paths accepted by `filter`, in sorted order.
    pub fn tracked<F>(&self, mut filter: F) -> Vec<PathBuf>
    where
        F: FnMut(&Path) -> bool,
    {
        self.files
            .keys()
            .filter(|p| filter(p))
            .cloned()
            .collect()
    }

    /// Apply one round of observations.
    ///
    /// - `matched`: probes of the paths the pattern currently expands to. A
    ///   `Modified` time that differs from the record (or has no record) is
    ///   stored and reported as changed. Other probes are ignored.
    /// - `tracked`: probes of previously recorded paths to check for
    ///   deletion. Only `Missing` removes an entry; other failures leave the
    ///   record untouched.
    pub fn reconcile<M, T>(&mut self, matched: M, tracked: T) -> Drift
    where
        M: IntoIterator<Item = (PathBuf, Probe)>,
        T: IntoIterator<Item = (PathBuf, Probe)>,
    {
        let mut drift = Drift::default();

        for (path, probe) in matched {
            let Probe::Modified(mtime) = probe else {
                continue;
            };
            if self.files.get(&path) == Some(&mtime) {
                continue;
            }
            self.files.insert(path.clone(), mtime);
            drift.changed.push(path);
        }

        for (path, probe) in tracked {
            if probe == Probe::Missing && self.files.remove(&path).is_some() {
                drift.removed.push(path);
            }
        }

        drift
    }
}
