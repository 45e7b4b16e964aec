//! Log line rendering

use chrono::Local;

use super::severity::Severity;

/// Render the current local time in the log line format
pub fn current_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Render one log line: `TIMESTAMP [LEVEL] message` plus a trailing newline
///
/// The timestamp is passed in so batch writes can share a single one.
pub fn render_line(timestamp: &str, severity: Severity, message: &str) -> String {
    let mut line = String::with_capacity(timestamp.len() + message.len() + 16);
    line.push_str(timestamp);
    line.push_str(" [");
    line.push_str(severity.as_str());
    line.push_str("] ");
    line.push_str(message);
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_line_shape() {
        let line = render_line("2026-08-06 12:00:00", Severity::Warn, "low disk space");
        assert_eq!(line, "2026-08-06 12:00:00 [WARN] low disk space\n");
    }

    #[test]
    fn test_render_line_ends_with_newline() {
        let line = render_line(&current_timestamp(), Severity::Info, "ok");
        assert!(line.ends_with("ok\n"));
    }

    #[test]
    fn test_current_timestamp_shape() {
        let ts = current_timestamp();
        // YYYY-MM-DD HH:MM:SS
        assert_eq!(ts.len(), 19);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], " ");
        assert_eq!(&ts[13..14], ":");
    }
}
