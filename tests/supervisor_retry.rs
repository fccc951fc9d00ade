// tests/supervisor_retry.rs

mod common;
use crate::common::fakes::{ScriptedRunner, Step};
use crate::common::{init_tracing, with_timeout, TestResult};

use warden::engine::{cancel_channel, JobSupervisor, RetryPolicy};
use warden::errors::WardenError;

fn policy(max_attempts: i64, can_fail: bool, one_time: bool) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        can_fail,
        one_time,
    }
}

#[tokio::test]
async fn failing_job_is_fatal_after_exactly_max_attempts() -> TestResult {
    init_tracing();

    let runner = ScriptedRunner::repeating(Step::Fail);
    let mut sup = JobSupervisor::new("api", policy(3, false, false), runner.clone());
    let (_tx, rx) = cancel_channel();

    let err = with_timeout(sup.run(rx)).await.unwrap_err();

    assert_eq!(runner.call_count(), 3);
    match &err {
        WardenError::MaxAttemptsReached { job, attempts } => {
            assert_eq!(job, "api");
            assert_eq!(*attempts, 3);
        }
        other => panic!("expected MaxAttemptsReached, got {other:?}"),
    }
    let msg = err.to_string();
    assert!(msg.contains("api"), "message should name the job: {msg}");
    assert!(msg.contains("exhausted"), "message should say attempts ran out: {msg}");
    Ok(())
}

#[tokio::test]
async fn can_fail_job_returns_ok_after_max_attempts() -> TestResult {
    init_tracing();

    let runner = ScriptedRunner::repeating(Step::Fail);
    let mut sup = JobSupervisor::new("cron", policy(2, true, false), runner.clone());
    let (_tx, rx) = cancel_channel();

    with_timeout(sup.run(rx)).await?;

    assert_eq!(runner.call_count(), 2);
    assert_eq!(sup.attempts(), 2);
    Ok(())
}

#[tokio::test]
async fn unset_max_attempts_means_three() -> TestResult {
    let runner = ScriptedRunner::repeating(Step::Fail);
    let mut sup = JobSupervisor::new("x", policy(0, false, false), runner.clone());
    let (_tx, rx) = cancel_channel();

    assert!(with_timeout(sup.run(rx)).await.is_err());
    assert_eq!(runner.call_count(), 3);
    Ok(())
}

#[tokio::test]
async fn restarts_never_consume_attempts() -> TestResult {
    init_tracing();

    let runner = ScriptedRunner::new([Step::Restart; 5], Step::Clean);
    let mut sup = JobSupervisor::new("migrate", policy(3, false, true), runner.clone());
    let (_tx, rx) = cancel_channel();

    with_timeout(sup.run(rx)).await?;

    assert_eq!(sup.attempts(), 0);
    assert_eq!(runner.call_count(), 6);
    assert_eq!(runner.calls().last(), Some(&Step::Clean));
    Ok(())
}

#[tokio::test]
async fn restarts_between_failures_do_not_extend_the_budget() -> TestResult {
    let runner = ScriptedRunner::new(
        [Step::Fail, Step::Restart, Step::Restart, Step::Fail],
        Step::Fail,
    );
    let mut sup = JobSupervisor::new("x", policy(3, false, false), runner.clone());
    let (_tx, rx) = cancel_channel();

    assert!(with_timeout(sup.run(rx)).await.is_err());

    // three counted failures, two free restarts
    assert_eq!(runner.call_count(), 5);
    assert_eq!(sup.attempts(), 3);
    Ok(())
}

#[tokio::test]
async fn one_time_job_stops_on_first_clean_exit() -> TestResult {
    let runner = ScriptedRunner::repeating(Step::Clean);
    let mut sup = JobSupervisor::new("init", policy(3, false, true), runner.clone());
    let (_tx, rx) = cancel_channel();

    with_timeout(sup.run(rx)).await?;

    assert_eq!(runner.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn clean_exits_of_long_running_jobs_count_as_attempts() -> TestResult {
    let runner = ScriptedRunner::repeating(Step::Clean);
    let mut sup = JobSupervisor::new("web", policy(2, false, false), runner.clone());
    let (_tx, rx) = cancel_channel();

    let err = with_timeout(sup.run(rx)).await.unwrap_err();

    assert!(matches!(err, WardenError::MaxAttemptsReached { attempts: 2, .. }));
    assert_eq!(runner.call_count(), 2);
    Ok(())
}

#[tokio::test]
async fn cancelled_supervisor_starts_nothing() -> TestResult {
    let runner = ScriptedRunner::repeating(Step::Fail);
    let mut sup = JobSupervisor::new("x", policy(3, false, false), runner.clone());
    let (tx, rx) = cancel_channel();
    tx.send(true)?;

    with_timeout(sup.run(rx)).await?;

    assert_eq!(runner.call_count(), 0);
    Ok(())
}

/// Requests cancellation from inside its first attempt, then fails it.
struct CancellingRunner {
    cancel_tx: tokio::sync::watch::Sender<bool>,
    calls: std::sync::Arc<std::sync::atomic::AtomicUsize>,
}

impl warden::exec::AttemptRunner for CancellingRunner {
    fn run_attempt(
        &mut self,
        _cancel: warden::engine::CancelRx,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = warden::engine::AttemptOutcome> + Send + '_>,
    > {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let _ = self.cancel_tx.send(true);
        Box::pin(async { warden::engine::AttemptOutcome::failed("killed during shutdown") })
    }
}

#[tokio::test]
async fn attempt_ending_after_cancellation_is_not_counted() -> TestResult {
    let (tx, rx) = cancel_channel();
    let calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let runner = CancellingRunner {
        cancel_tx: tx,
        calls: calls.clone(),
    };
    let mut sup = JobSupervisor::new("x", policy(1, false, false), runner);

    with_timeout(sup.run(rx)).await?;

    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(sup.attempts(), 0);
    Ok(())
}
