//! CLI binary for the filewatch path watcher.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use filewatch::{render_command, spawn_detached, Backoff, PathWatch};

/// Responsive poll cadence right after a change
const BASE_POLL: Duration = Duration::from_millis(500);
/// Pause between reappearance checks for a vanished path
const REAPPEAR_PAUSE: Duration = Duration::from_secs(5);
/// Reappearance checks before giving up
const MAX_REAPPEAR_ATTEMPTS: u32 = 5;

#[derive(Debug, Parser)]
#[command(name = "filewatch", version, about = "Run a command when a watched path changes")]
struct Args {
    /// Maximum idle poll interval in seconds
    #[arg(short = 'i', long, default_value_t = 30)]
    interval: u64,

    /// Log every poll and spawn
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Path to watch
    path: PathBuf,

    /// Command template; `{path}` is replaced with the watched path
    command: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "filewatch=debug"
    } else {
        "filewatch=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let watch = PathWatch::new(args.path.clone())
        .with_context(|| format!("Cannot access watched path {}", args.path.display()))?;

    let max_interval = Duration::from_secs(args.interval.max(1));
    run_watch_loop(watch, &args.command, max_interval).await;

    tracing::info!("Watcher shutting down");
    Ok(())
}

/// Poll until signaled, spawning the command on every detected change
async fn run_watch_loop(mut watch: PathWatch, template: &str, max_interval: Duration) {
    let mut shutdown = std::pin::pin!(shutdown_signal());
    let mut backoff = Backoff::new(BASE_POLL, max_interval);
    let mut wait = backoff.reset();
    let mut reappear_attempts = 0u32;

    loop {
        tokio::select! {
            _ = &mut shutdown => return,
            _ = tokio::time::sleep(wait) => {}
        }

        match watch.poll() {
            Ok(true) => {
                reappear_attempts = 0;
                let command = render_command(template, watch.path());
                tracing::debug!(command = %command, "Change detected");
                spawn_detached(&command);
                wait = backoff.reset();
            }
            Ok(false) => {
                reappear_attempts = 0;
                wait = backoff.next_idle();
            }
            Err(e) => {
                // Vanished path: retry a few times, re-arming on reappearance
                reappear_attempts += 1;
                if reappear_attempts > MAX_REAPPEAR_ATTEMPTS {
                    tracing::error!(
                        path = %watch.path().display(),
                        "Watched path did not reappear, giving up"
                    );
                    return;
                }
                tracing::warn!(path = %watch.path().display(), error = %e, "Watched path inaccessible");
                if watch.rearm().is_ok() {
                    tracing::info!(path = %watch.path().display(), "Watched path reappeared");
                    reappear_attempts = 0;
                    wait = backoff.reset();
                } else {
                    wait = REAPPEAR_PAUSE;
                }
            }
        }
    }
}

/// Resolves when a shutdown signal arrives
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let sigterm = signal(SignalKind::terminate());
    let sigint = signal(SignalKind::interrupt());
    match (sigterm, sigint) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
                _ = sigint.recv() => tracing::info!("Received SIGINT"),
            }
        }
        _ => {
            tracing::warn!("Cannot register signal handlers, falling back to ctrl-c");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Received interrupt");
}
