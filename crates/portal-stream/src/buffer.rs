use anyhow::Result;
use std::collections::VecDeque;

/// Accumulates raw byte chunks and hands back newline-terminated lines.
///
/// Chunks arrive at arbitrary granularity, so a partial line at the end of a
/// chunk stays buffered until the newline shows up in a later chunk.
pub struct LineBuffer {
    buffer: VecDeque<u8>,
}

impl LineBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    /// Append bytes to the buffer.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Extract the next complete line (up to `\n`), trimmed.
    ///
    /// Returns `None` while no complete line is buffered, and `Err` when the
    /// line is not valid UTF-8.
    pub fn next_line(&mut self) -> Option<Result<String>> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;

        let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();

        match std::str::from_utf8(&line_bytes) {
            Ok(line) => Some(Ok(line.trim().to_string())),
            Err(e) => Some(Err(anyhow::anyhow!("Invalid UTF-8 in line: {}", e))),
        }
    }

    /// Drain whatever remains after end-of-stream as one final line.
    ///
    /// A stream that closes without a trailing newline still carries a last
    /// logical line; callers flush it through here before completing.
    pub fn take_remaining(&mut self) -> Option<Result<String>> {
        if self.buffer.is_empty() {
            return None;
        }

        let line_bytes: Vec<u8> = self.buffer.drain(..).collect();

        match std::str::from_utf8(&line_bytes) {
            Ok(line) => Some(Ok(line.trim().to_string())),
            Err(e) => Some(Err(anyhow::anyhow!("Invalid UTF-8 in line: {}", e))),
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_lines() {
        let mut buffer = LineBuffer::with_capacity(64);

        buffer.push(b"line1\nline2\n");

        assert_eq!(buffer.next_line().unwrap().unwrap(), "line1");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "line2");
        assert!(buffer.next_line().is_none());
    }

    #[test]
    fn test_partial_line_buffered_across_pushes() {
        let mut buffer = LineBuffer::with_capacity(64);

        buffer.push(b"partial");
        assert!(buffer.next_line().is_none());

        buffer.push(b" line\n");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "partial line");
    }

    #[test]
    fn test_take_remaining_flushes_unterminated_line() {
        let mut buffer = LineBuffer::with_capacity(64);

        buffer.push(b"no trailing newline");
        assert!(buffer.next_line().is_none());

        assert_eq!(
            buffer.take_remaining().unwrap().unwrap(),
            "no trailing newline"
        );
        assert!(buffer.is_empty());
        assert!(buffer.take_remaining().is_none());
    }

    #[test]
    fn test_invalid_utf8_is_an_error_not_a_panic() {
        let mut buffer = LineBuffer::with_capacity(64);

        buffer.push(&[0xff, 0xfe, b'\n']);
        assert!(buffer.next_line().unwrap().is_err());
    }
}
