//! On-disk file sink with size-based rotation

use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// What a drain attempt did with the pending content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Content was written and flushed; the buffer should be cleared
    Written,
    /// The file could not be opened; content must be dropped to bound memory
    Dropped,
    /// The write failed; content stays buffered for the next drain
    Retained,
}

/// Owns the open file handle for one named stream
///
/// `current_size` always reflects bytes flushed to the handle. It is
/// initialized by seeking to end-of-file on every (re)open, never from
/// buffer state, so it stays correct across process restarts.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: Option<File>,
    current_size: u64,
}

impl FileSink {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            file: None,
            current_size: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    /// Write the full buffered content, rotating first when over the limit
    pub fn drain(&mut self, content: &str, rotation_limit: u64) -> DrainOutcome {
        if self.file.is_some() && self.current_size > rotation_limit {
            self.rotate();
        }

        if self.file.is_none() {
            match self.open() {
                Ok(()) => {}
                Err(e) => {
                    tracing::error!(
                        path = %self.path.display(),
                        error = %e,
                        "Cannot open log file, dropping buffered content"
                    );
                    return DrainOutcome::Dropped;
                }
            }
        }

        let Some(file) = self.file.as_mut() else {
            return DrainOutcome::Dropped;
        };

        if let Err(e) = file.write_all(content.as_bytes()).and_then(|_| file.flush()) {
            tracing::error!(
                path = %self.path.display(),
                error = %e,
                "Failed to write log file, closing handle"
            );
            // current_size stays unchanged; the reopen reseeks to the truth
            self.file = None;
            return DrainOutcome::Retained;
        }

        self.current_size += content.len() as u64;
        DrainOutcome::Written
    }

    /// Flush the open handle, if any
    pub fn flush_handle(&mut self) {
        if let Some(file) = self.file.as_mut() {
            if let Err(e) = file.flush() {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to flush log file");
            }
        }
    }

    /// Rename the current file to `.old`, replacing any previous one
    fn rotate(&mut self) {
        self.file = None;

        let old_path = rotated_path(&self.path);
        if old_path.exists() {
            if let Err(e) = fs::remove_file(&old_path) {
                tracing::warn!(path = %old_path.display(), error = %e, "Cannot delete rotated log");
            }
        }
        if let Err(e) = fs::rename(&self.path, &old_path) {
            tracing::error!(
                from = %self.path.display(),
                to = %old_path.display(),
                error = %e,
                "Cannot rotate log file"
            );
        }
        self.current_size = 0;
    }

    fn open(&mut self) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        self.current_size = file.seek(SeekFrom::End(0))?;
        self.file = Some(file);
        Ok(())
    }
}

/// Path of the rotated predecessor for a stream log file
pub fn rotated_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".old");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_drain_creates_and_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.log");
        let mut sink = FileSink::new(path.clone());

        assert_eq!(sink.drain("one\n", 1024), DrainOutcome::Written);
        assert_eq!(sink.drain("two\n", 1024), DrainOutcome::Written);

        assert_eq!(fs::read_to_string(&path).unwrap(), "one\ntwo\n");
        assert_eq!(sink.current_size(), 8);
    }

    #[test]
    fn test_reopen_initializes_size_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.log");
        fs::write(&path, "existing content\n").unwrap();

        let mut sink = FileSink::new(path.clone());
        assert_eq!(sink.drain("more\n", 1024), DrainOutcome::Written);
        assert_eq!(sink.current_size(), 17 + 5);
        assert_eq!(fs::read_to_string(&path).unwrap(), "existing content\nmore\n");
    }

    #[test]
    fn test_rotation_moves_content_to_old() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.log");
        let mut sink = FileSink::new(path.clone());

        // First drain exceeds the limit; rotation happens lazily on the next one
        assert_eq!(sink.drain("0123456789\n", 8), DrainOutcome::Written);
        assert_eq!(sink.drain("fresh\n", 8), DrainOutcome::Written);

        let old_path = rotated_path(&path);
        assert_eq!(fs::read_to_string(&old_path).unwrap(), "0123456789\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "fresh\n");
        assert_eq!(sink.current_size(), 6);
    }

    #[test]
    fn test_repeated_rotation_keeps_single_old_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.log");
        let mut sink = FileSink::new(path.clone());

        for i in 0..5 {
            let chunk = format!("chunk {i} padded to exceed the limit\n");
            sink.drain(&chunk, 8);
        }

        let files: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files.len(), 2);
        assert!(files.contains(&"main.log".to_string()));
        assert!(files.contains(&"main.log.old".to_string()));

        // The .old file holds exactly the pre-rotation content
        let old = fs::read_to_string(rotated_path(&path)).unwrap();
        assert_eq!(old, "chunk 3 padded to exceed the limit\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "chunk 4 padded to exceed the limit\n");
    }

    #[test]
    fn test_open_failure_drops_content() {
        let dir = TempDir::new().unwrap();
        // A path whose parent does not exist cannot be opened
        let path = dir.path().join("missing").join("main.log");
        let mut sink = FileSink::new(path);

        assert_eq!(sink.drain("lost\n", 1024), DrainOutcome::Dropped);
        assert!(!sink.is_open());
    }

    #[test]
    fn test_rotated_path_suffix() {
        assert_eq!(
            rotated_path(Path::new("/var/log/app/main.log")),
            PathBuf::from("/var/log/app/main.log.old")
        );
    }
}
