//! Protocol-level errors that are about the data model itself (version
//! mismatches, malformed capability data), distinct from wire error codes
//! in `mcp-jsonrpc` and from the local session errors in `mcp-server`/
//! `mcp-client`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum McpError {
    #[error("unsupported protocol version: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },

    #[error("malformed {field}: {reason}")]
    Malformed { field: String, reason: String },
}
