//! Incremental decoder for `data:`-framed event streams.

/// Buffers raw bytes and yields the payload of every complete event.
///
/// Events end at a blank line. The trailing fragment after the last blank
/// line is held until the next [`SseDecoder::push`]; whatever is still held
/// when the stream ends is dropped.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` and returns the `data` payloads of the events it
    /// completed, in order. Events with no `data:` line are skipped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut events = Vec::new();
        while let Some(pos) = self.buf.windows(2).position(|w| w == b"\n\n") {
            let raw: Vec<u8> = self.buf.drain(..pos + 2).collect();
            let text = String::from_utf8_lossy(&raw[..pos]);
            if let Some(data) = event_data(&text) {
                events.push(data);
            }
        }
        events
    }

    /// Bytes still waiting for their terminating blank line.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

fn event_data(event: &str) -> Option<String> {
    let lines: Vec<&str> = event
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
        .collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holds_partial_events_across_reads() {
        let mut dec = SseDecoder::new();
        assert!(dec.push(b"data: {\"step\":").is_empty());
        assert!(dec.pending() > 0);
        let out = dec.push(b"\"a\"}\n\ndata: {\"step\":\"b\"}\n");
        assert_eq!(out, vec![r#"{"step":"a"}"#]);
        let out = dec.push(b"\n");
        assert_eq!(out, vec![r#"{"step":"b"}"#]);
        assert_eq!(dec.pending(), 0);
    }

    #[test]
    fn crlf_and_multiline_data() {
        let mut dec = SseDecoder::new();
        let out = dec.push(b"data: one\r\ndata:two\r\n\r\n");
        assert_eq!(out, vec!["one\ntwo"]);
    }

    #[test]
    fn comments_and_blank_events_are_skipped() {
        let mut dec = SseDecoder::new();
        let out = dec.push(b": keep-alive\n\nevent: ping\n\ndata: x\n\n");
        assert_eq!(out, vec!["x"]);
    }
}
