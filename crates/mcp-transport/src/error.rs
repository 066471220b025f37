//! The transport-level error type consumed by `mcp-server` and `mcp-client`
//! when they wrap a [`crate::Transport`] failure into their own error enums
//! (§4.13, §6's "local errors").

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport closed: {0}")]
    Closed(String),

    #[error("malformed frame: {0}")]
    Malformed(String),
}
