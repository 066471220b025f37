use thiserror::Error;

pub type Result<T> = std::result::Result<T, HttpMcpError>;

#[derive(Debug, Error)]
pub enum HttpMcpError {
    #[error("http error: {0}")]
    Http(#[from] hyper::Error),

    #[error("json-rpc framing error: {0}")]
    JsonRpc(#[from] mcp_jsonrpc::ClassifyError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unknown or expired session")]
    UnknownSession,

    #[error("request carried no mcp-session-id header")]
    MissingSessionId,

    #[error("session closed before a response arrived")]
    SessionClosed,

    #[error("origin not permitted: {0}")]
    ForbiddenOrigin(String),
}
