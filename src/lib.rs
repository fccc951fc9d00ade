// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use anyhow::Result;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch as flag;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::engine::{cancel_channel, Runtime};
use crate::watch::reconciler::WatchRule;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - one supervisor + watch ticker per job
/// - Ctrl-C / SIGTERM handling
pub async fn run(args: CliArgs) -> Result<()> {
    let mut cfg = load_and_validate(&args.config)?;

    if let Some(interval) = args.watch_interval {
        cfg.set_watch_interval(interval);
    }

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let (cancel_tx, _cancel_rx) = cancel_channel();
    spawn_shutdown_listener(cancel_tx.clone())?;

    let runtime = Runtime::from_config(&cfg);
    runtime.run(cancel_tx).await?;
    Ok(())
}

/// Flip the cancellation flag on Ctrl-C or SIGTERM.
fn spawn_shutdown_listener(cancel_tx: flag::Sender<bool>) -> Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::spawn(async move {
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                if let Err(e) = res {
                    warn!(error = %e, "failed to listen for Ctrl+C");
                    return;
                }
                info!("received Ctrl+C; shutting down");
            }
            _ = sigterm.recv() => info!("received SIGTERM; shutting down"),
        }
        let _ = cancel_tx.send(true);
    });

    Ok(())
}

/// Simple dry-run output: print jobs, retry settings and watches.
fn print_dry_run(cfg: &ConfigFile) {
    println!("warden dry-run");
    println!("  config.watch_interval = {:?}", cfg.watch_interval());
    println!("  config.deletion_scope = {:?}", cfg.deletion_scope());
    println!();

    println!("jobs ({}):", cfg.jobs().len());
    for job in cfg.jobs() {
        println!("  - {}", job.name);
        println!("      command: {} {:?}", job.command, job.args);
        if !job.env.is_empty() {
            println!("      env: {:?}", job.env);
        }
        if let Some(dir) = &job.working_dir {
            println!("      working_dir: {}", dir.display());
        }
        println!(
            "      max_attempts: {}  can_fail: {}  one_time: {}",
            engine::RetryPolicy::from_job(job).effective_max_attempts(),
            job.can_fail,
            job.one_time
        );
        for watch in job.watches.iter() {
            let rule = WatchRule::new(&job.name, watch.clone());
            let signal = rule
                .signal
                .map(|s| s.to_string())
                .unwrap_or_else(|| "none".to_string());
            println!(
                "      watch: {}  signal: {}  restart: {}",
                watch.pattern, signal, watch.restart
            );
            if let Some(pre) = &watch.pre_command {
                println!("        pre_command: {} {:?}", pre.command, pre.args);
            }
            if let Some(post) = &watch.post_command {
                println!("        post_command: {} {:?}", post.command, post.args);
            }
        }
    }

    debug!("dry-run complete (no execution)");
}
