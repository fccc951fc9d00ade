// tests/process_backend.rs

mod common;
use crate::common::builders::hook;
use crate::common::{init_tracing, wait_until, with_timeout, TestResult};

use std::fs;

use nix::sys::signal::Signal;
use warden::config::HookConfig;
use warden::engine::{cancel_channel, AttemptOutcome};
use warden::exec::{AttemptRunner, ManagedProcess, ProcessControl, ProcessSpec};
use warden::watch::{HookRunner, ProcessHookRunner};

fn sh(script: &str) -> ProcessSpec {
    ProcessSpec {
        command: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        env: vec![],
        working_dir: None,
    }
}

async fn wait_for_pid(process: &ManagedProcess) {
    wait_until("process to start", || process.pid().is_some()).await;
}

#[tokio::test]
async fn zero_exit_is_clean() -> TestResult {
    init_tracing();
    let mut process = ManagedProcess::new("ok", sh("exit 0"));
    let (_tx, rx) = cancel_channel();

    let outcome = with_timeout(process.run_attempt(rx)).await;

    assert!(matches!(outcome, AttemptOutcome::Clean), "{outcome:?}");
    assert_eq!(process.pid(), None);
    Ok(())
}

#[tokio::test]
async fn non_zero_exit_is_a_failure() -> TestResult {
    let mut process = ManagedProcess::new("bad", sh("exit 3"));
    let (_tx, rx) = cancel_channel();

    match with_timeout(process.run_attempt(rx)).await {
        AttemptOutcome::Failed(err) => assert!(err.to_string().contains('3'), "{err}"),
        other => panic!("expected failure, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn unknown_command_is_a_failure() -> TestResult {
    let spec = ProcessSpec {
        command: "/nonexistent/warden-test-binary".to_string(),
        args: vec![],
        env: vec![],
        working_dir: None,
    };
    let mut process = ManagedProcess::new("missing", spec);
    let (_tx, rx) = cancel_channel();

    let outcome = with_timeout(process.run_attempt(rx)).await;

    assert!(matches!(outcome, AttemptOutcome::Failed(_)));
    Ok(())
}

#[tokio::test]
async fn marked_process_killed_by_signal_reports_restart() -> TestResult {
    init_tracing();
    let process = ManagedProcess::new("svc", sh("exec sleep 30"));
    let (_tx, rx) = cancel_channel();

    let mut runner = process.clone();
    let attempt = tokio::spawn(async move { runner.run_attempt(rx).await });

    wait_for_pid(&process).await;
    process.mark_for_restart();
    process.signal(Signal::SIGTERM);

    let outcome = with_timeout(attempt).await?;
    assert!(matches!(outcome, AttemptOutcome::RestartRequested), "{outcome:?}");
    Ok(())
}

#[tokio::test]
async fn restart_mark_does_not_leak_into_the_next_attempt() -> TestResult {
    let mut process = ManagedProcess::new("svc", sh("exit 1"));
    let (_tx, rx) = cancel_channel();

    // Marked while nothing is running.
    process.mark_for_restart();

    let outcome = with_timeout(process.run_attempt(rx)).await;
    assert!(matches!(outcome, AttemptOutcome::Failed(_)), "{outcome:?}");
    Ok(())
}

#[tokio::test]
async fn unmarked_process_killed_by_signal_is_a_failure() -> TestResult {
    let process = ManagedProcess::new("svc", sh("exec sleep 30"));
    let (_tx, rx) = cancel_channel();

    let mut runner = process.clone();
    let attempt = tokio::spawn(async move { runner.run_attempt(rx).await });

    wait_for_pid(&process).await;
    process.signal(Signal::SIGKILL);

    let outcome = with_timeout(attempt).await?;
    assert!(matches!(outcome, AttemptOutcome::Failed(_)), "{outcome:?}");
    Ok(())
}

#[tokio::test]
async fn cancellation_terminates_the_running_process() -> TestResult {
    let process = ManagedProcess::new("svc", sh("exec sleep 30"));
    let (tx, rx) = cancel_channel();

    let mut runner = process.clone();
    let attempt = tokio::spawn(async move { runner.run_attempt(rx).await });

    wait_for_pid(&process).await;
    tx.send(true)?;

    with_timeout(attempt).await?;
    assert_eq!(process.pid(), None);
    Ok(())
}

#[tokio::test]
async fn signal_without_running_process_is_a_no_op() -> TestResult {
    let process = ManagedProcess::new("idle", sh("exit 0"));

    process.signal(Signal::SIGHUP);

    assert_eq!(process.pid(), None);
    Ok(())
}

#[tokio::test]
async fn child_gets_inherited_env_plus_configured_entries() -> TestResult {
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("env.txt");

    let spec = ProcessSpec {
        env: vec![
            "GREETING=hello".to_string(),
            format!("OUT={}", out.display()),
            "GREETING=bonjour".to_string(),
        ],
        ..sh(r#"printf '%s:%s' "$GREETING" "${PATH:+has-path}" > "$OUT""#)
    };
    let mut process = ManagedProcess::new("env", spec);
    let (_tx, rx) = cancel_channel();

    let outcome = with_timeout(process.run_attempt(rx)).await;
    assert!(matches!(outcome, AttemptOutcome::Clean), "{outcome:?}");

    assert_eq!(fs::read_to_string(&out)?, "bonjour:has-path");
    Ok(())
}

#[tokio::test]
async fn child_runs_in_the_configured_working_dir() -> TestResult {
    let dir = tempfile::tempdir()?;

    let spec = ProcessSpec {
        working_dir: Some(dir.path().to_path_buf()),
        ..sh("echo here > marker.txt")
    };
    let mut process = ManagedProcess::new("cwd", spec);
    let (_tx, rx) = cancel_channel();

    with_timeout(process.run_attempt(rx)).await;

    assert_eq!(fs::read_to_string(dir.path().join("marker.txt"))?, "here\n");
    Ok(())
}

#[tokio::test]
async fn hook_runner_passes_args_and_env() -> TestResult {
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("hook.txt");

    let hook = HookConfig {
        command: "sh".to_string(),
        args: vec![
            "-c".to_string(),
            r#"printf '%s %s' "$1" "$STAGE" > "$OUT""#.to_string(),
            "hook".to_string(),
            "reload".to_string(),
        ],
        env: vec!["STAGE=pre".to_string(), format!("OUT={}", out.display())],
    };

    with_timeout(ProcessHookRunner.run("web", &hook)).await?;

    assert_eq!(fs::read_to_string(&out)?, "reload pre");
    Ok(())
}

#[tokio::test]
async fn hook_runner_reports_non_zero_exit() -> TestResult {
    let result = with_timeout(ProcessHookRunner.run("web", &hook("false"))).await;

    let err = result.expect_err("`false` must fail");
    assert!(err.to_string().contains("false"), "{err}");
    Ok(())
}

#[tokio::test]
async fn hook_runner_rejects_missing_command() -> TestResult {
    let result = with_timeout(ProcessHookRunner.run("web", &HookConfig::default())).await;

    let err = result.expect_err("empty command must fail");
    assert!(err.to_string().contains("command is missing"));
    Ok(())
}
