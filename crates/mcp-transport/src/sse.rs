//! Server-Sent Events codec (§4.4).
//!
//! The encoder turns one outgoing JSON-RPC message into one SSE event with
//! `event: message` framing (the MCP-conventional default). The decoder is a
//! chunk-tolerant stream parser: it owns a byte buffer, accepts arbitrarily
//! split input on [`SseDecoder::feed`], and returns every complete event it
//! can assemble, retaining any trailing partial event for the next call.

use serde_json::Value;

/// One decoded SSE event. `data` is the concatenation of every `data:` line
/// in the event, joined by `\n`, per the SSE spec.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub id: Option<String>,
    pub retry: Option<u64>,
    pub data: String,
}

impl SseEvent {
    pub fn data_message(data: String) -> Self {
        Self {
            event: Some("message".to_string()),
            data,
            ..Default::default()
        }
    }

    /// Parse `data` as one JSON-RPC wire object, if it decodes.
    pub fn data_as_json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.data)
    }
}

/// Encode one JSON-RPC message as a single `event: message` SSE frame,
/// optionally tagged with an `id:` line for resumability hints (§4.4, §6 —
/// ids are emitted but resumption is not implemented by this runtime).
pub fn encode_event(value: &Value, id: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(id) = id {
        out.push_str("id: ");
        out.push_str(id);
        out.push('\n');
    }
    out.push_str("event: message\n");
    // A JSON-RPC message never contains an embedded newline once serialized
    // (serde_json never emits one for compact output), so a single `data:`
    // line is always sufficient.
    out.push_str("data: ");
    out.push_str(&value.to_string());
    out.push_str("\n\n");
    out
}

/// Encode a named, non-`message` event (used for the dispatcher's
/// `sse_done`/error terminal frames in `mcp-http-server`).
pub fn encode_named_event(event: &str, value: &Value) -> String {
    format!("event: {event}\ndata: {value}\n\n")
}

/// A chunk-tolerant SSE stream parser.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed newly-arrived bytes (or a text chunk) and return every complete
    /// event assembled so far. Incomplete trailing data is retained for the
    /// next call.
    pub fn feed(&mut self, chunk: &str) -> Vec<SseEvent> {
        self.buffer.push_str(chunk);
        let mut events = Vec::new();

        loop {
            // An event is terminated by a blank line (`\n\n` or `\r\n\r\n`).
            let Some(boundary) = find_blank_line(&self.buffer) else {
                break;
            };
            let raw_event: String = self.buffer.drain(..boundary.end).collect();
            let raw_event = &raw_event[..boundary.start];
            if let Some(event) = parse_event(raw_event) {
                events.push(event);
            }
        }

        events
    }
}

struct Boundary {
    start: usize,
    end: usize,
}

/// Find the first blank-line terminator, returning the byte range of the
/// event body (`start`) and where to resume scanning for the next event
/// (`end`).
fn find_blank_line(buffer: &str) -> Option<Boundary> {
    if let Some(pos) = buffer.find("\n\n") {
        return Some(Boundary {
            start: pos,
            end: pos + 2,
        });
    }
    if let Some(pos) = buffer.find("\r\n\r\n") {
        return Some(Boundary {
            start: pos,
            end: pos + 4,
        });
    }
    None
}

fn parse_event(raw: &str) -> Option<SseEvent> {
    let mut event = SseEvent::default();
    let mut data_lines = Vec::new();
    let mut saw_any_field = false;

    for line in raw.split(['\n']) {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        if line.starts_with(':') {
            // Comment line, per SSE spec — ignored entirely.
            continue;
        }
        saw_any_field = true;
        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };
        match field {
            "event" => event.event = Some(value.to_string()),
            "id" => event.id = Some(value.to_string()),
            "retry" => event.retry = value.parse().ok(),
            "data" => data_lines.push(value.to_string()),
            _ => {}
        }
    }

    if !saw_any_field {
        return None;
    }
    event.data = data_lines.join("\n");
    Some(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encode_then_decode_round_trips() {
        let msg = json!({"jsonrpc":"2.0","id":1,"result":{"ok":true}});
        let frame = encode_event(&msg, None);
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(&frame);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event.as_deref(), Some("message"));
        assert_eq!(events[0].data_as_json().unwrap(), msg);
    }

    #[test]
    fn decoder_tolerates_chunk_boundaries() {
        let msg = json!({"jsonrpc":"2.0","method":"notifications/progress"});
        let frame = encode_event(&msg, None);
        let midpoint = frame.len() / 2;
        let (first, second) = frame.split_at(midpoint);

        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(first).is_empty());
        let events = decoder.feed(second);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data_as_json().unwrap(), msg);
    }

    #[test]
    fn decoder_accumulates_multiple_data_lines() {
        let raw = "event: message\ndata: line one\ndata: line two\n\n";
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(raw);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "line one\nline two");
    }

    #[test]
    fn decoder_ignores_comment_lines() {
        let raw = ": keepalive\n\n";
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(raw).is_empty());
    }

    #[test]
    fn decoder_parses_multiple_events_in_one_feed() {
        let a = encode_event(&json!({"a": 1}), Some("1"));
        let b = encode_event(&json!({"b": 2}), Some("2"));
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(&format!("{a}{b}"));
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id.as_deref(), Some("1"));
        assert_eq!(events[1].id.as_deref(), Some("2"));
    }

    #[test]
    fn named_terminal_event_round_trips() {
        let done = json!({"jsonrpc":"2.0","id":1,"result":{}});
        let frame = encode_named_event("sse_done", &done);
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(&frame);
        assert_eq!(events[0].event.as_deref(), Some("sse_done"));
        assert_eq!(events[0].data_as_json().unwrap(), done);
    }
}
