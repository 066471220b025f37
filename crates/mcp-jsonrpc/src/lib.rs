//! JSON-RPC 2.0 wire codec for the MCP runtime.
//!
//! This crate owns the envelope types shared by every MCP transport: the
//! [`RequestId`], the three message shapes (`Request`/`Response`/
//! `Notification`), the [`classify`] function that turns a decoded JSON value
//! into one of those shapes, and the canonical JSON-RPC + MCP error code
//! table. It has no opinion about transports, sessions, or method bodies —
//! those live in `mcp-protocol`, `mcp-transport`, `mcp-server`, and
//! `mcp-client`.

pub mod error;
pub mod message;

pub use error::{JsonRpcErrorCode, JsonRpcErrorObject};
pub use message::{
    ClassifyError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, Message, RequestId,
    ResponseOutcome, classify, encode,
};

/// The only JSON-RPC version this runtime speaks.
pub const JSONRPC_VERSION: &str = "2.0";
