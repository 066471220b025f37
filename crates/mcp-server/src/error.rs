use mcp_jsonrpc::JsonRpcErrorObject;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum McpServerError {
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("session is not ready")]
    NotReady,

    #[error("session is already initialized")]
    AlreadyInitialized,

    #[error("session closed: {0}")]
    Closed(String),

    #[error("request timed out")]
    Timeout,

    #[error("client returned an error: {0}")]
    RemoteError(JsonRpcErrorObject),
}
