//! SSE (Server-Sent Events) framing utilities
//!
//! Outbound: every frame the gateway writes is `data: <payload>\n\n`, and a stream
//! always ends with `data: [DONE]\n\n`.
//!
//! Inbound: upstream bodies arrive as byte chunks that do not line up with line
//! boundaries; [`LineBuffer`] reassembles them and [`decode_stream`] runs the
//! lines through a provider's [`LineDecoder`].

use std::fmt::Display;

use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::providers::{EventStream, ProviderEvent};
use crate::wire::StreamChunk;

/// Payload of the terminal frame
pub const DONE_MARKER: &str = "[DONE]";

/// Format a stream chunk as an SSE data frame: `data: {json}\n\n`
pub fn format_sse_chunk(chunk: &StreamChunk) -> Bytes {
    let json = serde_json::to_string(chunk).expect("StreamChunk should always serialize");
    Bytes::from(format!("data: {}\n\n", json))
}

/// The terminal frame: `data: [DONE]\n\n`
pub fn format_sse_done() -> Bytes {
    Bytes::from_static(b"data: [DONE]\n\n")
}

/// Payload of an upstream SSE `data:` line, if it is one
///
/// Accepts both `data: x` and `data:x`.
pub fn sse_data(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(|rest| rest.trim_start())
}

/// Buffer for reassembling lines split across chunk boundaries.
///
/// Works for SSE (`data:` lines) and newline-delimited JSON alike.
///
/// # Example
/// ```
/// use switchboard::streaming::LineBuffer;
///
/// let mut buffer = LineBuffer::new();
///
/// let lines = buffer.feed(b"data: {\"content\":\"hel");
/// assert!(lines.is_empty());
///
/// let lines = buffer.feed(b"lo\"}\n");
/// assert_eq!(lines, vec!["data: {\"content\":\"hello\"}"]);
/// ```
#[derive(Debug, Default)]
pub struct LineBuffer {
    /// Bytes after the last newline seen so far
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes and return every line completed by them.
    ///
    /// Line terminators (`\n` or `\r\n`) are stripped and blank lines skipped.
    /// Bytes are only decoded once a full line is present, so a multi-byte
    /// character split across chunks survives intact.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            if let Some(line) = decode_line(&raw[..raw.len() - 1]) {
                lines.push(line);
            }
        }
        lines
    }

    /// Flush the unterminated tail at end of stream
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        decode_line(&rest)
    }
}

/// Maps the lines of one upstream body to provider events
pub trait LineDecoder {
    fn decode_line(&mut self, line: &str) -> Vec<ProviderEvent>;

    /// Events owed once the body has ended
    fn finish(&mut self) -> Vec<ProviderEvent>;
}

/// Decode a whole upstream body already in memory
pub fn decode_body<D: LineDecoder>(body: &[u8], decoder: &mut D) -> Vec<ProviderEvent> {
    let mut lines = LineBuffer::new();
    let mut events: Vec<ProviderEvent> = lines
        .feed(body)
        .iter()
        .flat_map(|line| decoder.decode_line(line))
        .collect();
    if let Some(line) = lines.finish() {
        events.extend(decoder.decode_line(&line));
    }
    events.extend(decoder.finish());
    events
}

/// Decode a streamed upstream body into provider events
///
/// The stream ends right after the first terminal event, so the rest of the
/// upstream body is never read. A transport error becomes a `Failed` event.
pub fn decode_stream<S, E, D>(body: S, mut decoder: D, upstream: &'static str) -> EventStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
    D: LineDecoder + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut body = Box::pin(body);
        let mut lines = LineBuffer::new();

        while let Some(item) = body.next().await {
            let chunk = match item {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield ProviderEvent::Failed(format!("{} stream read failed: {}", upstream, e));
                    return;
                }
            };
            for line in lines.feed(&chunk) {
                for event in decoder.decode_line(&line) {
                    let terminal = event.is_terminal();
                    yield event;
                    if terminal {
                        return;
                    }
                }
            }
        }

        let mut tail = match lines.finish() {
            Some(line) => decoder.decode_line(&line),
            None => Vec::new(),
        };
        tail.extend(decoder.finish());
        for event in tail {
            let terminal = event.is_terminal();
            yield event;
            if terminal {
                return;
            }
        }
    })
}

fn decode_line(raw: &[u8]) -> Option<String> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    if raw.iter().all(|b| b.is_ascii_whitespace()) {
        return None;
    }
    Some(String::from_utf8_lossy(raw).into_owned())
}
