//! CLI binary for the logmon buffered log writer.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use logmon::batch;
use logmon::config::Settings;
use logmon::logger::{LogManager, Severity};

#[derive(Debug, Parser)]
#[command(name = "logmon", version, about = "Buffered multi-stream log writer with rotation")]
struct Cli {
    /// Log directory
    #[arg(short = 'd', long, env = "LOGMON_DIR")]
    log_dir: Option<PathBuf>,

    /// Severity threshold: 1-4 or error|warn|info|debug
    #[arg(short = 'l', long, env = "LOGMON_LEVEL")]
    level: Option<Severity>,

    /// Buffer size in bytes that triggers an immediate drain
    #[arg(long)]
    buffer_threshold: Option<usize>,

    /// On-disk size in bytes at which a stream file rotates
    #[arg(long)]
    rotation_limit: Option<u64>,

    /// Low-power mode: larger buffers, slower flush cadence
    #[arg(short = 'p', long)]
    low_power: bool,

    /// Optional TOML settings file
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run in the foreground, flushing buffers until signaled
    Daemon,
    /// Append one entry to a stream and flush it
    Write {
        /// Stream name
        #[arg(short = 'n', long, default_value = "main")]
        stream: String,
        /// Message text
        #[arg(short = 'm', long)]
        message: String,
    },
    /// Append entries parsed from a `severity|message` file
    Batch {
        /// Stream name
        #[arg(short = 'n', long, default_value = "main")]
        stream: String,
        /// Batch input file
        file: PathBuf,
    },
    /// Drain one stream, or every stream when none is given
    Flush {
        /// Stream name
        stream: Option<String>,
    },
    /// Delete every managed log file in the log directory
    Clean,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Diagnostics go to stderr, never into the managed log streams
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logmon=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(log_dir) = cli.log_dir {
        settings.log_dir = log_dir;
    }
    if let Some(level) = cli.level {
        settings.level = level;
    }
    if let Some(buffer_threshold) = cli.buffer_threshold {
        settings.buffer_threshold = buffer_threshold;
    }
    if let Some(rotation_limit) = cli.rotation_limit {
        settings.rotation_limit = rotation_limit;
    }
    settings.low_power |= cli.low_power;

    let manager = LogManager::new(&settings)?;

    match cli.command.unwrap_or(Command::Daemon) {
        Command::Daemon => run_daemon(&manager, &settings).await?,
        Command::Write { stream, message } => {
            manager.write(&stream, settings.level, &message);
            manager.flush(&stream);
        }
        Command::Batch { stream, file } => {
            let entries = batch::parse_batch_file(&file)?;
            manager.batch_write(&stream, &entries);
            manager.flush(&stream);
        }
        Command::Flush { stream } => match stream {
            Some(stream) => manager.flush(&stream),
            None => manager.flush_all(),
        },
        Command::Clean => manager.clean(),
    }

    manager.stop();
    Ok(())
}

/// Block until SIGTERM or SIGINT, then stop the manager
///
/// Shutdown runs here on the main task; signal reception only interrupts
/// the wait, so `stop()` never executes in handler context.
async fn run_daemon(manager: &LogManager, settings: &Settings) -> Result<()> {
    #[cfg(unix)]
    // Log files should be group/world readable regardless of caller umask
    unsafe {
        libc::umask(0o022);
    }

    let startup = if settings.low_power {
        "Daemon started (low power)"
    } else {
        "Daemon started"
    };
    manager.write("main", Severity::Info, startup);
    tracing::info!(log_dir = %settings.log_dir.display(), "Daemon running");

    wait_for_shutdown_signal().await?;

    manager.write("main", Severity::Info, "Daemon stopping");
    manager.stop();
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
        _ = sigint.recv() => tracing::info!("Received SIGINT"),
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!("Received interrupt");
    Ok(())
}
