//! Log manager: shared state, public operations, and the background flush loop
//!
//! All buffers, sinks, and sink I/O are guarded by one coordination lock.
//! Draining happens while the lock is held, so no thread can observe a
//! half-drained buffer.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};

use super::buffer::StreamBuffer;
use super::format;
use super::policy::{PowerModePolicy, IDLE_DRAIN_AFTER};
use super::severity::Severity;
use super::sink::{DrainOutcome, FileSink};
use crate::config::Settings;

/// Fatal construction errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configured log path exists but is not a directory
    #[error("log path exists but is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The log directory could not be created
    #[error("cannot create log directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The background flush thread could not be started
    #[error("cannot start flush thread: {0}")]
    SpawnThread(std::io::Error),
}

/// Buffers and sinks, guarded together by the coordination lock
#[derive(Default)]
struct Inner {
    buffers: HashMap<String, StreamBuffer>,
    sinks: HashMap<String, FileSink>,
}

/// State shared between the producer path and the flush thread
struct Shared {
    inner: Mutex<Inner>,
    wakeup: Condvar,
    running: AtomicBool,
    low_power: AtomicBool,
    buffer_threshold: AtomicUsize,
    rotation_limit: AtomicU64,
    severity_threshold: AtomicU8,
    log_dir: PathBuf,
}

impl Shared {
    /// Append rendered text to a named buffer, draining inline when urgent
    /// or over the threshold, then wake the background loop
    fn append(&self, stream: &str, text: &str, urgent: bool) {
        {
            let mut inner = self.inner.lock();
            let buffer = inner.buffers.entry(stream.to_string()).or_default();
            buffer.append(text);
            let size = buffer.len();
            if urgent || size >= self.buffer_threshold.load(Ordering::Relaxed) {
                self.drain_stream(&mut inner, stream);
            }
        }
        self.wakeup.notify_one();
    }

    /// Drain one named buffer through its sink. Must be called with the lock held.
    fn drain_stream(&self, inner: &mut Inner, name: &str) {
        let Some(buffer) = inner.buffers.get_mut(name) else {
            return;
        };
        if buffer.is_empty() {
            return;
        }

        let sink = inner
            .sinks
            .entry(name.to_string())
            .or_insert_with(|| FileSink::new(self.log_dir.join(format!("{name}.log"))));

        let limit = self.rotation_limit.load(Ordering::Relaxed);
        match sink.drain(buffer.content(), limit) {
            // Dropped content is explicit data loss, already logged by the sink
            DrainOutcome::Written | DrainOutcome::Dropped => buffer.clear(),
            DrainOutcome::Retained => {}
        }
    }

    /// Drain every non-empty buffer, then flush every open handle
    fn flush_all(&self) {
        let mut inner = self.inner.lock();
        let pending: Vec<String> = inner
            .buffers
            .iter()
            .filter(|(_, buffer)| !buffer.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        for name in &pending {
            self.drain_stream(&mut inner, name);
        }
        for sink in inner.sinks.values_mut() {
            sink.flush_handle();
        }
    }
}

/// Concurrent, buffered, multi-stream log writer
///
/// Owns the per-stream buffers and file sinks and runs a background flush
/// thread that drains idle or oversized buffers on a timer. Entries written
/// to the same stream reach its file in submission order; there is no
/// ordering guarantee across streams.
pub struct LogManager {
    shared: Arc<Shared>,
    flush_thread: Option<JoinHandle<()>>,
}

impl LogManager {
    /// Validate the log directory and start the background flush thread
    pub fn new(settings: &Settings) -> Result<Self, ConfigError> {
        prepare_log_directory(&settings.log_dir)?;

        let params = PowerModePolicy::params(settings.low_power);
        let buffer_threshold = if settings.low_power {
            params.buffer_threshold
        } else {
            settings.buffer_threshold
        };

        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner::default()),
            wakeup: Condvar::new(),
            running: AtomicBool::new(true),
            low_power: AtomicBool::new(settings.low_power),
            buffer_threshold: AtomicUsize::new(buffer_threshold),
            rotation_limit: AtomicU64::new(settings.rotation_limit),
            severity_threshold: AtomicU8::new(settings.level.value()),
            log_dir: settings.log_dir.clone(),
        });

        let loop_shared = Arc::clone(&shared);
        let flush_thread = std::thread::Builder::new()
            .name("logmon-flush".to_string())
            .spawn(move || flush_loop(loop_shared))
            .map_err(ConfigError::SpawnThread)?;

        Ok(Self {
            shared,
            flush_thread: Some(flush_thread),
        })
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Currently active severity threshold
    pub fn severity_threshold(&self) -> Severity {
        Severity::from_value(self.shared.severity_threshold.load(Ordering::Relaxed))
            .unwrap_or(Severity::Info)
    }

    /// Currently active buffer-size threshold in bytes
    pub fn buffer_threshold(&self) -> usize {
        self.shared.buffer_threshold.load(Ordering::Relaxed)
    }

    /// Append one entry to a named stream
    ///
    /// No-op when the manager is stopped or the severity does not pass the
    /// threshold. Drains the stream inline (blocking on file I/O) when the
    /// entry is Error severity or the buffer crossed its size threshold.
    pub fn write(&self, stream: &str, severity: Severity, message: &str) {
        if !self.is_running() || !self.severity_threshold().retains(severity) {
            return;
        }
        let line = format::render_line(&format::current_timestamp(), severity, message);
        self.shared.append(stream, &line, severity == Severity::Error);
    }

    /// Append several entries to a named stream with one shared timestamp
    ///
    /// Entries below the severity threshold are filtered per-entry; the
    /// surviving lines land in the buffer as a single append. Drains inline
    /// when any surviving entry was Error severity or the buffer crossed
    /// its size threshold.
    pub fn batch_write(&self, stream: &str, entries: &[(Severity, String)]) {
        if entries.is_empty() || !self.is_running() {
            return;
        }

        let threshold = self.severity_threshold();
        let timestamp = format::current_timestamp();
        let mut combined = String::with_capacity(entries.len() * 100);
        let mut has_error = false;

        for (severity, message) in entries {
            if threshold.retains(*severity) {
                combined.push_str(&format::render_line(&timestamp, *severity, message));
                has_error |= *severity == Severity::Error;
            }
        }

        if combined.is_empty() {
            return;
        }
        self.shared.append(stream, &combined, has_error);
    }

    /// Force a drain of one named stream, if present and non-empty
    pub fn flush(&self, stream: &str) {
        if !self.is_running() {
            return;
        }
        let mut inner = self.shared.inner.lock();
        self.shared.drain_stream(&mut inner, stream);
    }

    /// Drain every non-empty buffer and flush every open handle
    pub fn flush_all(&self) {
        if !self.is_running() {
            return;
        }
        self.shared.flush_all();
    }

    /// Discard all sinks and buffers, then best-effort delete every managed
    /// log file (current and rotated) in the log directory
    pub fn clean(&self) {
        if !self.is_running() {
            return;
        }
        let mut inner = self.shared.inner.lock();
        inner.sinks.clear();
        inner.buffers.clear();
        remove_stream_logs(&self.shared.log_dir);
    }

    pub fn set_buffer_threshold(&self, bytes: usize) {
        self.shared.buffer_threshold.store(bytes, Ordering::Relaxed);
    }

    pub fn set_severity_threshold(&self, severity: Severity) {
        self.shared
            .severity_threshold
            .store(severity.value(), Ordering::Relaxed);
    }

    pub fn set_rotation_limit(&self, bytes: u64) {
        self.shared.rotation_limit.store(bytes, Ordering::Relaxed);
    }

    /// Switch power regimes: applies the policy buffer threshold and wakes
    /// the background loop so the new cadence takes effect immediately
    pub fn set_low_power(&self, enabled: bool) {
        self.shared.low_power.store(enabled, Ordering::Relaxed);
        let params = PowerModePolicy::params(enabled);
        self.shared
            .buffer_threshold
            .store(params.buffer_threshold, Ordering::Relaxed);
        // Locked notify, so the new cadence applies without waiting out the
        // old timer even when the loop is about to re-enter its wait
        let _inner = self.shared.inner.lock();
        self.shared.wakeup.notify_all();
    }

    /// Stop accepting writes, wake the flush loop, and perform one final
    /// drain of every buffer before releasing sinks
    ///
    /// Idempotent; later calls are no-ops. Does not retry failed I/O.
    pub fn stop(&self) {
        if self.shared.running.swap(false, Ordering::SeqCst) {
            // Notify under the lock so the flush loop cannot slip between
            // its running check and the wait
            {
                let _inner = self.shared.inner.lock();
                self.shared.wakeup.notify_all();
            }
            self.shared.flush_all();
            let mut inner = self.shared.inner.lock();
            inner.sinks.clear();
            inner.buffers.clear();
        }
    }
}

impl Drop for LogManager {
    fn drop(&mut self) {
        self.stop();
        if let Some(handle) = self.flush_thread.take() {
            let _ = handle.join();
        }
    }
}

/// Background sweep: drains idle or oversized buffers, flushes open sinks,
/// and evicts sinks whose handle was closed by a failed write
fn flush_loop(shared: Arc<Shared>) {
    loop {
        let params = PowerModePolicy::params(shared.low_power.load(Ordering::Relaxed));
        let mut inner = shared.inner.lock();
        if !shared.running.load(Ordering::SeqCst) {
            break;
        }
        shared.wakeup.wait_for(&mut inner, params.loop_wait);

        if !shared.running.load(Ordering::SeqCst) {
            break;
        }

        let threshold = shared.buffer_threshold.load(Ordering::Relaxed);
        let due: Vec<String> = inner
            .buffers
            .iter()
            .filter(|(_, buffer)| {
                !buffer.is_empty()
                    && (buffer.idle_for() > IDLE_DRAIN_AFTER || buffer.len() > threshold / 2)
            })
            .map(|(name, _)| name.clone())
            .collect();
        for name in &due {
            shared.drain_stream(&mut inner, name);
        }

        inner.sinks.retain(|name, sink| {
            if sink.is_open() {
                sink.flush_handle();
                true
            } else {
                tracing::debug!(stream = %name, "Evicting closed sink");
                false
            }
        });
    }
}

/// Delete every `*.log` / `*.log.old` file in the log directory, reporting
/// but not aborting on individual failures
fn remove_stream_logs(log_dir: &Path) {
    let entries = match fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!(path = %log_dir.display(), error = %e, "Cannot open log directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.ends_with(".log") || name.ends_with(".log.old") {
            if let Err(e) = fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), error = %e, "Cannot delete log file");
            }
        }
    }
}

/// Ensure the log directory exists and is usable
///
/// An existing non-directory is fatal. An existing directory that is not
/// writable gets its permissions relaxed rather than failing.
fn prepare_log_directory(dir: &Path) -> Result<(), ConfigError> {
    if dir.exists() {
        if !dir.is_dir() {
            return Err(ConfigError::NotADirectory(dir.to_path_buf()));
        }
        relax_permissions(dir);
        return Ok(());
    }

    fs::create_dir_all(dir).map_err(|source| ConfigError::CreateDirectory {
        path: dir.to_path_buf(),
        source,
    })?;
    set_default_permissions(dir);
    Ok(())
}

#[cfg(unix)]
fn relax_permissions(dir: &Path) {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let Ok(c_path) = CString::new(dir.as_os_str().as_bytes()) else {
        return;
    };
    let accessible = unsafe { libc::access(c_path.as_ptr(), libc::W_OK | libc::X_OK) } == 0;
    if !accessible {
        set_default_permissions(dir);
    }
}

#[cfg(not(unix))]
fn relax_permissions(_dir: &Path) {}

#[cfg(unix)]
fn set_default_permissions(dir: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Err(e) = fs::set_permissions(dir, fs::Permissions::from_mode(0o755)) {
        tracing::warn!(path = %dir.display(), error = %e, "Cannot set log directory permissions");
    }
}

#[cfg(not(unix))]
fn set_default_permissions(_dir: &Path) {}
