//! Log entry severity levels

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Severity of a log entry, ordered by priority
///
/// Lower numeric value means higher priority. The configured threshold
/// retains an entry only when its value is less than or equal to the
/// threshold value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Severity {
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
}

impl Severity {
    /// Numeric value as used in batch files and on the CLI
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Get the display name for this severity
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warn => "WARN",
            Severity::Info => "INFO",
            Severity::Debug => "DEBUG",
        }
    }

    /// Look up a severity by its numeric value (1-4)
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(Severity::Error),
            2 => Some(Severity::Warn),
            3 => Some(Severity::Info),
            4 => Some(Severity::Debug),
            _ => None,
        }
    }

    /// Check whether an entry at `entry` severity passes this threshold
    pub fn retains(self, entry: Severity) -> bool {
        entry.value() <= self.value()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a severity cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid severity '{0}' (expected 1-4 or error|warn|info|debug)")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    /// Accepts the numeric form (`1`-`4`) and case-insensitive names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(value) = s.parse::<u8>() {
            return Severity::from_value(value).ok_or_else(|| ParseSeverityError(s.to_string()));
        }
        match s.to_ascii_uppercase().as_str() {
            "ERROR" => Ok(Severity::Error),
            "WARN" => Ok(Severity::Warn),
            "INFO" => Ok(Severity::Info),
            "DEBUG" => Ok(Severity::Debug),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_by_priority() {
        assert!(Severity::Error < Severity::Warn);
        assert!(Severity::Warn < Severity::Info);
        assert!(Severity::Info < Severity::Debug);
    }

    #[test]
    fn test_threshold_retains() {
        let threshold = Severity::Info;
        assert!(threshold.retains(Severity::Error));
        assert!(threshold.retains(Severity::Warn));
        assert!(threshold.retains(Severity::Info));
        assert!(!threshold.retains(Severity::Debug));
    }

    #[test]
    fn test_parse_numeric() {
        assert_eq!("1".parse::<Severity>().unwrap(), Severity::Error);
        assert_eq!("4".parse::<Severity>().unwrap(), Severity::Debug);
        assert!("5".parse::<Severity>().is_err());
        assert!("0".parse::<Severity>().is_err());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("ERROR".parse::<Severity>().unwrap(), Severity::Error);
        assert_eq!("warn".parse::<Severity>().unwrap(), Severity::Warn);
        assert_eq!(" Info ".parse::<Severity>().unwrap(), Severity::Info);
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn test_value_round_trip() {
        for sev in [
            Severity::Error,
            Severity::Warn,
            Severity::Info,
            Severity::Debug,
        ] {
            assert_eq!(Severity::from_value(sev.value()), Some(sev));
        }
    }
}
