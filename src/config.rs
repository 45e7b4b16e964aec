//! Configuration management for logmon

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::logger::Severity;

/// Runtime settings for the log manager
///
/// Loaded from an optional TOML file, then overridden by CLI flags.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding one `<stream>.log` file per stream
    pub log_dir: PathBuf,

    /// Severity threshold; entries below it are discarded
    pub level: Severity,

    /// Buffer size in bytes at which a write triggers an immediate drain
    pub buffer_threshold: usize,

    /// On-disk size in bytes at which a stream file is rotated
    pub rotation_limit: u64,

    /// Trade flush latency for fewer wakeups
    pub low_power: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            level: Severity::Info,
            buffer_threshold: 8 * 1024,
            rotation_limit: 100 * 1024,
            low_power: false,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file, or return defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                toml::from_str(&content)
                    .with_context(|| format!("Failed to parse config file {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }
}

/// Default log directory under the platform data dir
///
/// Falls back to /tmp when no data dir can be determined.
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("logmon")
        .join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.level, Severity::Info);
        assert_eq!(settings.buffer_threshold, 8 * 1024);
        assert_eq!(settings.rotation_limit, 100 * 1024);
        assert!(!settings.low_power);
    }

    #[test]
    fn test_load_without_path_uses_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.buffer_threshold, Settings::default().buffer_threshold);
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("logmon.toml");
        std::fs::write(&path, "level = \"debug\"\nrotation_limit = 4096\n").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.level, Severity::Debug);
        assert_eq!(settings.rotation_limit, 4096);
        assert_eq!(settings.buffer_threshold, 8 * 1024);
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let result = Settings::load(Some(Path::new("/nonexistent/logmon.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_default_log_dir_ends_with_logs() {
        let dir = default_log_dir();
        assert!(dir.ends_with("logmon/logs"));
    }
}
