//! Batch input file parsing
//!
//! Batch files carry one `severity|message` entry per line. `#`-prefixed
//! lines and blank lines are ignored. An unparsable severity falls back to
//! Info with a warning; a line without a separator is skipped with a warning.

use std::path::Path;

use anyhow::{Context, Result};

use crate::logger::Severity;

/// Parse a batch file into ordered (severity, message) entries
pub fn parse_batch_file(path: &Path) -> Result<Vec<(Severity, String)>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot open batch file {}", path.display()))?;
    Ok(parse_batch_lines(&content))
}

/// Parse batch entries from text, skipping malformed lines with a diagnostic
pub fn parse_batch_lines(content: &str) -> Vec<(Severity, String)> {
    let mut entries = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line_num = index + 1;
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((level_part, message_part)) = line.split_once('|') else {
            tracing::warn!(line = line_num, "Skipping batch line without separator");
            continue;
        };

        let severity = match level_part.trim().parse::<Severity>() {
            Ok(severity) => severity,
            Err(e) => {
                tracing::warn!(line = line_num, error = %e, "Defaulting batch line to INFO");
                Severity::Info
            }
        };

        entries.push((severity, message_part.trim_start().to_string()));
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_and_named_severities() {
        let entries = parse_batch_lines("1|disk full\nWARN|slow io\n3|ok\n");
        assert_eq!(
            entries,
            vec![
                (Severity::Error, "disk full".to_string()),
                (Severity::Warn, "slow io".to_string()),
                (Severity::Info, "ok".to_string()),
            ]
        );
    }

    #[test]
    fn test_comments_and_blank_lines_ignored() {
        let entries = parse_batch_lines("# header\n\n2|real entry\n# trailing\n");
        assert_eq!(entries, vec![(Severity::Warn, "real entry".to_string())]);
    }

    #[test]
    fn test_bad_severity_defaults_to_info() {
        let entries = parse_batch_lines("bad|oops\n");
        assert_eq!(entries, vec![(Severity::Info, "oops".to_string())]);
    }

    #[test]
    fn test_line_without_separator_skipped() {
        let entries = parse_batch_lines("no separator here\n4|kept\n");
        assert_eq!(entries, vec![(Severity::Debug, "kept".to_string())]);
    }

    #[test]
    fn test_spec_scenario_mixed_file() {
        let entries = parse_batch_lines("1|disk full\nbad|oops\n# comment\n3|ok\n");
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], (Severity::Error, "disk full".to_string()));
        assert_eq!(entries[1], (Severity::Info, "oops".to_string()));
        assert_eq!(entries[2], (Severity::Info, "ok".to_string()));
    }

    #[test]
    fn test_message_whitespace_trimmed_left_only() {
        let entries = parse_batch_lines("2 | padded message \n");
        assert_eq!(entries, vec![(Severity::Warn, "padded message ".to_string())]);
    }

    #[test]
    fn test_parse_batch_file_missing() {
        let result = parse_batch_file(Path::new("/nonexistent/batch.txt"));
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_batch_file_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("batch.txt");
        std::fs::write(&path, "1|first\n4|second\n").unwrap();

        let entries = parse_batch_file(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, Severity::Error);
        assert_eq!(entries[1].1, "second");
    }
}
