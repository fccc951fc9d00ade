use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use nix::sys::signal::Signal;
use warden::config::HookConfig;
use warden::engine::{AttemptOutcome, CancelRx};
use warden::exec::{AttemptRunner, ProcessControl};
use warden::watch::HookRunner;

/// Shape of a scripted attempt outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Clean,
    Restart,
    Fail,
}

impl Step {
    fn outcome(self) -> AttemptOutcome {
        match self {
            Step::Clean => AttemptOutcome::Clean,
            Step::Restart => AttemptOutcome::RestartRequested,
            Step::Fail => AttemptOutcome::failed("scripted failure"),
        }
    }
}

/// An attempt runner that:
/// - replays a fixed script of outcomes, then repeats `fallback` forever
/// - counts how many attempts were started.
#[derive(Debug, Clone)]
pub struct ScriptedRunner {
    script: Arc<Mutex<VecDeque<Step>>>,
    fallback: Step,
    calls: Arc<Mutex<Vec<Step>>>,
}

impl ScriptedRunner {
    pub fn new(script: impl IntoIterator<Item = Step>, fallback: Step) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            fallback,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always returns `step`.
    pub fn repeating(step: Step) -> Self {
        Self::new(Vec::<Step>::new(), step)
    }

    /// Outcomes handed out so far, in order.
    pub fn calls(&self) -> Vec<Step> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl AttemptRunner for ScriptedRunner {
    fn run_attempt(
        &mut self,
        _cancel: CancelRx,
    ) -> Pin<Box<dyn Future<Output = AttemptOutcome> + Send + '_>> {
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);
        self.calls.lock().unwrap().push(step);

        Box::pin(async move {
            tokio::task::yield_now().await;
            step.outcome()
        })
    }
}

/// Everything the watch side did, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Hook(String),
    MarkRestart,
    Signal(Signal),
}

/// Shared, ordered log of [`Event`]s.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Return all events recorded so far and clear the log.
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

/// Process control that only records what it was asked to do.
#[derive(Debug, Clone)]
pub struct RecordingControl {
    log: EventLog,
}

impl RecordingControl {
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

impl ProcessControl for RecordingControl {
    fn signal(&self, signal: Signal) {
        self.log.push(Event::Signal(signal));
    }

    fn mark_for_restart(&self) {
        self.log.push(Event::MarkRestart);
    }
}

/// Hook runner that records hook commands; commands listed in `failing`
/// report an error after being recorded.
#[derive(Debug, Clone)]
pub struct RecordingHooks {
    log: EventLog,
    failing: Vec<String>,
}

impl RecordingHooks {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            failing: Vec::new(),
        }
    }

    pub fn failing(mut self, command: &str) -> Self {
        self.failing.push(command.to_string());
        self
    }
}

impl HookRunner for RecordingHooks {
    fn run<'a>(
        &'a self,
        _job: &'a str,
        hook: &'a HookConfig,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.log.push(Event::Hook(hook.command.clone()));
            if self.failing.contains(&hook.command) {
                return Err(anyhow!("hook '{}' failed", hook.command));
            }
            Ok(())
        })
    }
}
