//! Per-stream write-back buffer

use std::time::{Duration, Instant};

/// Initial capacity reserved for each stream buffer
const RESERVE_BYTES: usize = 16 * 1024;

/// In-memory accumulation area for one named log stream
///
/// Content is append-only between drains; a drain either writes the whole
/// content or leaves it in place.
#[derive(Debug)]
pub struct StreamBuffer {
    content: String,
    last_write: Instant,
}

impl StreamBuffer {
    pub fn new() -> Self {
        Self {
            content: String::with_capacity(RESERVE_BYTES),
            last_write: Instant::now(),
        }
    }

    /// Append rendered text and refresh the last-write time
    pub fn append(&mut self, text: &str) {
        self.content.push_str(text);
        self.last_write = Instant::now();
    }

    /// Current buffered content
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Time since the last append
    pub fn idle_for(&self) -> Duration {
        self.last_write.elapsed()
    }

    /// Discard the buffered content, keeping the reservation
    pub fn clear(&mut self) {
        self.content.clear();
    }
}

impl Default for StreamBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_accumulates_in_order() {
        let mut buffer = StreamBuffer::new();
        assert!(buffer.is_empty());

        buffer.append("first\n");
        buffer.append("second\n");

        assert_eq!(buffer.content(), "first\nsecond\n");
        assert_eq!(buffer.len(), 13);
    }

    #[test]
    fn test_clear_empties_content() {
        let mut buffer = StreamBuffer::new();
        buffer.append("data\n");
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.content(), "");
    }

    #[test]
    fn test_idle_resets_on_append() {
        let mut buffer = StreamBuffer::new();
        std::thread::sleep(Duration::from_millis(20));
        assert!(buffer.idle_for() >= Duration::from_millis(20));

        buffer.append("x");
        assert!(buffer.idle_for() < Duration::from_millis(20));
    }
}
