// src/watch/reconciler.rs

use std::fmt;
use std::sync::Arc;

use nix::sys::signal::Signal;
use tracing::{debug, info, warn};

use crate::config::{JobConfig, WatchConfig};
use crate::exec::ProcessControl;
use crate::fs::FileSystem;
use crate::types::DeletionScope;
use crate::watch::hooks::HookRunner;
use crate::watch::patterns::WatchPattern;
use crate::watch::state::{Drift, Probe, WatchState};

/// A watch together with the signal it delivers on drift.
#[derive(Debug, Clone)]
pub struct WatchRule {
    pub config: WatchConfig,
    pub signal: Option<Signal>,
}

impl WatchRule {
    /// Resolve the signal of `config`.
    ///
    /// Without an explicit signal, restarting watches send `SIGTERM` so the
    /// marked process actually exits; other watches deliver nothing, same as
    /// signal `0`.
    pub fn new(job: &str, config: WatchConfig) -> Self {
        let signal = match &config.signal {
            None if config.restart => Some(Signal::SIGTERM),
            None => None,
            Some(spec) => spec.resolve().unwrap_or_else(|err| {
                warn!(job = %job, pattern = %config.pattern, error = %err, "ignoring invalid signal");
                None
            }),
        };
        Self { config, signal }
    }
}

/// Polls a job's watch patterns and reacts to drift.
///
/// Owns the job's [`WatchState`]. `pass` takes `&mut self`, so two passes
/// for the same job can never overlap.
pub struct WatchReconciler {
    job: String,
    rules: Vec<WatchRule>,
    state: WatchState,
    scope: DeletionScope,
    fs: Arc<dyn FileSystem>,
    control: Arc<dyn ProcessControl>,
    hooks: Arc<dyn HookRunner>,
}

impl fmt::Debug for WatchReconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchReconciler")
            .field("job", &self.job)
            .field("rules", &self.rules)
            .field("state", &self.state)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl WatchReconciler {
    /// Build a reconciler and record the current state of every watched
    /// file, so pre-existing files are not reported as changed on the first
    /// pass.
    pub fn new(
        job: impl Into<String>,
        watches: Vec<WatchConfig>,
        scope: DeletionScope,
        fs: Arc<dyn FileSystem>,
        control: Arc<dyn ProcessControl>,
        hooks: Arc<dyn HookRunner>,
    ) -> Self {
        let job = job.into();
        let state = WatchState::initialize(fs.as_ref(), &watches);
        let rules = watches
            .into_iter()
            .map(|w| WatchRule::new(&job, w))
            .collect();

        Self {
            job,
            rules,
            state,
            scope,
            fs,
            control,
            hooks,
        }
    }

    pub fn for_job(
        job: &JobConfig,
        scope: DeletionScope,
        fs: Arc<dyn FileSystem>,
        control: Arc<dyn ProcessControl>,
        hooks: Arc<dyn HookRunner>,
    ) -> Self {
        Self::new(job.name.clone(), job.watches.clone(), scope, fs, control, hooks)
    }

    pub fn state(&self) -> &WatchState {
        &self.state
    }

    pub fn rules(&self) -> &[WatchRule] {
        &self.rules
    }

    /// Run one reconciliation pass over all watches, in configuration order.
    ///
    /// Nothing is returned: pattern errors, stat failures and hook failures
    /// are logged and the pass moves on.
    pub async fn pass(&mut self) {
        let Self {
            job,
            rules,
            state,
            scope,
            fs,
            control,
            hooks,
        } = self;

        for rule in rules.iter() {
            let pattern = match WatchPattern::new(&rule.config.pattern) {
                Ok(pattern) => pattern,
                Err(err) => {
                    warn!(
                        job = %job,
                        pattern = %rule.config.pattern,
                        error = %format!("{err:#}"),
                        "failed to watch pattern"
                    );
                    continue;
                }
            };

            let drift = detect_drift(state, &pattern, *scope, &**fs);
            if drift.is_empty() {
                continue;
            }

            for path in drift.changed.iter().chain(drift.removed.iter()) {
                info!(job = %job, path = %path.display(), "file changed, signalling process");
            }

            react(job, rule, &**control, &**hooks).await;
        }
    }
}

fn detect_drift(
    state: &mut WatchState,
    pattern: &WatchPattern,
    scope: DeletionScope,
    fs: &dyn FileSystem,
) -> Drift {
    let matched: Vec<_> = pattern
        .expand(fs)
        .into_iter()
        .map(|path| {
            let probe = Probe::of(fs, &path);
            (path, probe)
        })
        .collect();

    let tracked: Vec<_> = state
        .tracked(|path| scope == DeletionScope::All || pattern.matches(path))
        .into_iter()
        .map(|path| {
            let probe = Probe::of(fs, &path);
            (path, probe)
        })
        .collect();

    state.reconcile(matched, tracked)
}

/// Pre hook, restart mark, signal, post hook. Hook failures never stop the
/// sequence.
async fn react(
    job: &str,
    rule: &WatchRule,
    control: &dyn ProcessControl,
    hooks: &dyn HookRunner,
) {
    if let Some(pre) = &rule.config.pre_command {
        if let Err(err) = hooks.run(job, pre).await {
            warn!(job = %job, error = %format!("{err:#}"), "failed to execute pre watch command");
        }
    }

    if rule.config.restart {
        control.mark_for_restart();
    }

    match rule.signal {
        Some(signal) => control.signal(signal),
        None => debug!(job = %job, "watch has signal 0; nothing delivered"),
    }

    if let Some(post) = &rule.config.post_command {
        if let Err(err) = hooks.run(job, post).await {
            warn!(job = %job, error = %format!("{err:#}"), "failed to execute post watch command");
        }
    }
}
