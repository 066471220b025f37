use mcp_jsonrpc::JsonRpcErrorObject;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum McpClientError {
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("client is not ready (state: {0})")]
    NotReady(&'static str),

    #[error("session closed: {0}")]
    Closed(String),

    #[error("request timed out")]
    Timeout,

    #[error("server returned an error: {0}")]
    RemoteError(JsonRpcErrorObject),

    #[error("unsupported response content-type: {0}")]
    UnsupportedContentType(String),
}
