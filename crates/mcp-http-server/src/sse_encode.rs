//! Thin naming layer over [`mcp_transport::sse`] for the dispatcher's three
//! chunk kinds (§4.6, §4.7): intermediate `sse_event`s, the terminal
//! `sse_done`, and a best-effort error frame sent when a session closes with
//! streams still open.

use mcp_transport::sse::encode_named_event;
use serde_json::Value;

pub fn event_frame(value: &Value) -> String {
    encode_named_event("sse_event", value)
}

pub fn done_frame(value: &Value) -> String {
    encode_named_event("sse_done", value)
}

pub fn error_frame(reason: &str) -> String {
    encode_named_event("sse_error", &serde_json::json!({ "reason": reason }))
}
