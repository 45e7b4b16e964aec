//! Stat-based change detection and idle backoff

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// What a stat check observed about the watched path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Snapshot {
    modified: SystemTime,
    len: u64,
}

/// Detects modifications to one path by comparing stat snapshots
///
/// Tracks both mtime and size, so appends land even on filesystems with
/// coarse timestamp granularity.
#[derive(Debug)]
pub struct PathWatch {
    path: PathBuf,
    last: Snapshot,
}

impl PathWatch {
    /// Take the initial snapshot; fails when the path is inaccessible
    pub fn new(path: PathBuf) -> io::Result<Self> {
        let last = take_snapshot(&path)?;
        Ok(Self { path, last })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check the path, returning true when it changed since the last check
    pub fn poll(&mut self) -> io::Result<bool> {
        let current = take_snapshot(&self.path)?;
        let changed = current != self.last;
        self.last = current;
        Ok(changed)
    }

    /// Refresh the snapshot without reporting a change, after the path
    /// reappeared
    pub fn rearm(&mut self) -> io::Result<()> {
        self.last = take_snapshot(&self.path)?;
        Ok(())
    }
}

fn take_snapshot(path: &Path) -> io::Result<Snapshot> {
    let metadata = fs::metadata(path)?;
    Ok(Snapshot {
        modified: metadata.modified()?,
        len: metadata.len(),
    })
}

/// Idle poll cadence: doubles while nothing changes, resets on a change
#[derive(Debug)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        let max = max.max(base);
        Self {
            base,
            max,
            current: base,
        }
    }

    /// Wait to use for an idle poll; grows toward the maximum
    pub fn next_idle(&mut self) -> Duration {
        let wait = self.current;
        self.current = (self.current * 2).min(self.max);
        wait
    }

    /// Drop back to the responsive cadence after a change
    pub fn reset(&mut self) -> Duration {
        self.current = self.base;
        self.base
    }
}
