//! The Streamable HTTP transport (§4.5-§4.7): a server-side per-session
//! transport plus the request dispatcher that owns the session registry and
//! picks JSON or SSE response framing.
//!
//! This crate depends on `hyper`/`hyper-util`/`http-body-util` directly so
//! that `mcp-server`, which only needs the session-engine abstractions, does
//! not have to pull in an HTTP stack to support the stdio-only case.

pub mod dispatcher;
pub mod error;
pub mod protocol;
pub mod session_transport;
pub mod sse_encode;

pub use dispatcher::{Dispatcher, ResponseMode, SessionFactory};
pub use error::{HttpMcpError, Result};
pub use session_transport::{DeliverOutcome, HttpSessionTransport, StreamChunk};
