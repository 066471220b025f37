//! Transport contract (§4.2), the stdio transport (§4.3), and the SSE codec
//! (§4.4).
//!
//! A [`Transport`] is an owned, process-like resource a session drives
//! through three operations (`start`, `send`, `close`) and which delivers
//! exactly two kinds of events back to its owner (`message`, `closed`).
//! `mcp-server` and `mcp-client` depend on this crate for the stdio
//! transport and for SSE encode/decode; the HTTP transports in
//! `mcp-http-server`/`mcp-client` implement [`Transport`] themselves on top
//! of `hyper`/`reqwest` rather than reusing the stdio implementation here.

pub mod error;
pub mod sse;
pub mod stdio;
pub mod transport;

pub use error::TransportError;
pub use sse::{SseDecoder, SseEvent};
pub use stdio::StdioTransport;
pub use transport::{SendOptions, Transport, TransportEvent, TransportOwner};
