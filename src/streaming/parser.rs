//! Incremental event-stream parser
//!
//! Accumulates raw bytes and emits an event for every block terminated by a
//! blank line:
//! - Buffer: 1MB maximum for a single undispatched block
//! - Line endings: `\n`, `\r\n` and bare `\r`
//! - Fields: `event`, `data` (multiple lines joined with `\n`), `id`, `retry`
//! - Lines starting with `:` are comments
//!
//! A trailing block without its blank line is never emitted.

use crate::errors::{Result, VaikerError};
use crate::streaming::event::{EventType, ServerSentEvent};

/// Maximum buffer size (1MB)
pub const MAX_BUFFER_SIZE: usize = 1_048_576;

/// Fields of the block being assembled
#[derive(Debug, Default)]
struct PendingBlock {
    event: Option<String>,
    data: Vec<String>,
    id: Option<String>,
    retry: Option<u64>,
}

impl PendingBlock {
    fn is_empty(&self) -> bool {
        self.event.is_none() && self.data.is_empty() && self.id.is_none() && self.retry.is_none()
    }

    fn take_event(&mut self) -> Option<ServerSentEvent> {
        let block = std::mem::take(self);
        if block.event.is_none() && block.data.is_empty() {
            return None;
        }

        Some(ServerSentEvent {
            event: EventType::parse(block.event.as_deref().unwrap_or("message")),
            data: block.data.join("\n"),
            id: block.id,
            retry: block.retry,
        })
    }
}

/// Incremental SSE parser
#[derive(Debug)]
pub struct SseParser {
    /// Bytes of the current, not yet terminated line
    buffer: Vec<u8>,

    /// Fields seen since the last dispatch
    block: PendingBlock,

    /// Bytes held for the current block
    block_bytes: usize,

    /// Previous chunk ended on `\r`; a leading `\n` belongs to it
    skip_lf: bool,

    max_buffer_size: usize,
}

impl SseParser {
    /// Create new parser with default settings
    pub fn new() -> Self {
        Self::with_capacity(MAX_BUFFER_SIZE)
    }

    /// Create parser with custom buffer capacity
    pub fn with_capacity(max_buffer_size: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            block: PendingBlock::default(),
            block_bytes: 0,
            skip_lf: false,
            max_buffer_size,
        }
    }

    /// Feed bytes and return every event completed by them, in order
    pub fn add_bytes(&mut self, bytes: &[u8]) -> Result<Vec<ServerSentEvent>> {
        let mut events = Vec::new();
        self.feed(bytes, &mut events)?;
        Ok(events)
    }

    /// Feed bytes, appending completed events to `events`.
    ///
    /// On overflow the events completed before the oversized block are
    /// already in `events` when the error is returned.
    pub fn feed<E>(&mut self, bytes: &[u8], events: &mut E) -> Result<()>
    where
        E: Extend<ServerSentEvent>,
    {
        for &byte in bytes {
            if self.skip_lf {
                self.skip_lf = false;
                if byte == b'\n' {
                    continue;
                }
            }

            match byte {
                b'\n' => self.end_line(events),
                b'\r' => {
                    self.skip_lf = true;
                    self.end_line(events);
                }
                _ => {
                    self.buffer.push(byte);
                    self.block_bytes += 1;
                    if self.block_bytes > self.max_buffer_size {
                        return Err(VaikerError::Http {
                            message: format!(
                                "Event stream block exceeds maximum size of {} bytes",
                                self.max_buffer_size
                            ),
                            events_delivered: None,
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Handle one complete line
    fn end_line<E: Extend<ServerSentEvent>>(&mut self, events: &mut E) {
        let line = String::from_utf8_lossy(&self.buffer).into_owned();
        self.buffer.clear();

        if line.is_empty() {
            events.extend(self.block.take_event());
            self.block_bytes = 0;
            return;
        }

        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line.as_str(), ""),
        };

        match field {
            "event" => self.block.event = Some(value.to_string()),
            "data" => self.block.data.push(value.to_string()),
            "id" if !value.contains('\0') => self.block.id = Some(value.to_string()),
            "retry" => {
                if let Ok(ms) = value.parse() {
                    self.block.retry = Some(ms);
                }
            }
            _ => {}
        }
    }

    /// Drop whatever belongs to an unterminated block
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.block = PendingBlock::default();
        self.block_bytes = 0;
        self.skip_lf = false;
    }

    /// Check if nothing is pending
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty() && self.block.is_empty()
    }

    /// Get current buffer size
    pub fn buffer_size(&self) -> usize {
        self.block_bytes
    }
}

impl Default for SseParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    const STREAM: &str = "event: output\ndata: Hello\n\nevent: logs\ndata: step 1\n\n: keep-alive\n\nevent: output\nid: 2\ndata: , world\n\nevent: done\ndata: {}\n\n";

    #[test]
    fn test_simple_event() {
        let mut parser = SseParser::new();

        let events = parser.add_bytes(b"event: output\ndata: Hello\n\n").unwrap();
        assert_eq!(events, vec![ServerSentEvent::new(EventType::Output, "Hello")]);
        assert!(parser.is_empty());
    }

    #[test]
    fn test_incremental_event() {
        let mut parser = SseParser::new();

        assert!(parser.add_bytes(b"event: out").unwrap().is_empty());
        assert!(parser.add_bytes(b"put\ndata: Hel").unwrap().is_empty());
        assert!(parser.add_bytes(b"lo\n").unwrap().is_empty());

        let events = parser.add_bytes(b"\n").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "Hello");
    }

    #[test]
    fn test_stream_order_preserved() {
        let mut parser = SseParser::new();
        let events = parser.add_bytes(STREAM.as_bytes()).unwrap();

        let tags: Vec<&str> = events.iter().map(|e| e.event.as_str()).collect();
        assert_eq!(tags, vec!["output", "logs", "output", "done"]);
        assert_eq!(events[2].id.as_deref(), Some("2"));
        assert_eq!(events[3].data, "{}");
    }

    #[test]
    fn test_multiline_data() {
        let mut parser = SseParser::new();
        let events = parser
            .add_bytes(b"event: output\ndata: line one\ndata: line two\n\n")
            .unwrap();
        assert_eq!(events[0].data, "line one\nline two");
    }

    #[test]
    fn test_crlf_and_cr_line_endings() {
        let mut parser = SseParser::new();
        let events = parser
            .add_bytes(b"event: logs\r\ndata: a\r\n\r\nevent: logs\rdata: b\r\r")
            .unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data, "a");
        assert_eq!(events[1].data, "b");
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        let mut parser = SseParser::new();
        assert!(parser.add_bytes(b"data: x\r").unwrap().is_empty());
        let events = parser.add_bytes(b"\n\r\n").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "x");
    }

    #[test]
    fn test_unknown_event_type_passed_through() {
        let mut parser = SseParser::new();
        let events = parser.add_bytes(b"event: metrics\ndata: {\"t\": 1}\n\n").unwrap();
        assert_eq!(events[0].event, EventType::Other("metrics".to_string()));
    }

    #[test]
    fn test_data_without_event_defaults_to_message() {
        let mut parser = SseParser::new();
        let events = parser.add_bytes(b"data: hi\n\n").unwrap();
        assert_eq!(events[0].event, EventType::Other("message".to_string()));
    }

    #[test]
    fn test_field_without_space_and_retry() {
        let mut parser = SseParser::new();
        let events = parser.add_bytes(b"event:error\ndata:boom\nretry: 3000\n\n").unwrap();
        assert_eq!(events[0].event, EventType::Error);
        assert_eq!(events[0].data, "boom");
        assert_eq!(events[0].retry, Some(3000));
    }

    #[test]
    fn test_blank_lines_only() {
        let mut parser = SseParser::new();
        assert!(parser.add_bytes(b"\n\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_partial_block_discarded_on_clear() {
        let mut parser = SseParser::new();
        parser.add_bytes(b"event: output\ndata: partial").unwrap();
        assert!(!parser.is_empty());

        parser.clear();
        assert!(parser.is_empty());
        assert_eq!(parser.buffer_size(), 0);
    }

    #[test]
    fn test_buffer_overflow() {
        let mut parser = SseParser::with_capacity(100);

        let large_data = vec![b'a'; 150];
        let result = parser.add_bytes(&large_data);

        assert!(matches!(result, Err(VaikerError::Http { .. })));
    }

    #[test]
    fn test_feed_keeps_events_completed_before_overflow() {
        let mut parser = SseParser::with_capacity(100);
        let mut events = Vec::new();

        let mut chunk = b"event: output\ndata: complete\n\n".to_vec();
        chunk.extend(vec![b'a'; 150]);

        assert!(parser.feed(&chunk, &mut events).is_err());
        assert_eq!(events, vec![ServerSentEvent::new(EventType::Output, "complete")]);
    }

    #[test]
    fn test_multibyte_utf8_split() {
        let mut parser = SseParser::new();
        let bytes = "data: héllo\n\n".as_bytes();
        let (left, right) = bytes.split_at(8);

        assert!(parser.add_bytes(left).unwrap().is_empty());
        let events = parser.add_bytes(right).unwrap();
        assert_eq!(events[0].data, "héllo");
    }

    #[quickcheck]
    fn prop_chunking_does_not_change_events(splits: Vec<usize>) -> bool {
        let bytes = STREAM.as_bytes();
        let expected = SseParser::new().add_bytes(bytes).unwrap();

        let mut cuts: Vec<usize> = splits.into_iter().map(|s| s % (bytes.len() + 1)).collect();
        cuts.sort_unstable();

        let mut parser = SseParser::new();
        let mut events = Vec::new();
        let mut start = 0;
        for cut in cuts.into_iter().chain(std::iter::once(bytes.len())) {
            events.extend(parser.add_bytes(&bytes[start..cut]).unwrap());
            start = cut;
        }

        events == expected
    }
}
