//! Canonical JSON-RPC and MCP error codes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Wire-visible error kinds, each with a fixed numeric code.
///
/// Every variant here is something that crosses the wire inside a
/// [`crate::message::JsonRpcResponse`] error object. Local-only failures
/// (timeouts, closed transports) never become a `JsonRpcErrorCode` — see
/// each crate's own error enum for those.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonRpcErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    /// `resources/read` against a URI the server does not have.
    ResourceNotFound,
    /// Elicitation must happen out-of-band via a URL rather than inline.
    UrlElicitationRequired,
    /// The user declined a `sampling/createMessage` request.
    UserRejectedSampling,
    /// Implementation-defined server error in the reserved `-32099..=-32000` range.
    ServerError(i64),
}

impl JsonRpcErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::ResourceNotFound => -32002,
            Self::UrlElicitationRequired => -32042,
            Self::UserRejectedSampling => -1,
            Self::ServerError(code) => *code,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::InvalidRequest => "Invalid Request",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::InternalError => "Internal error",
            Self::ResourceNotFound => "Resource not found",
            Self::UrlElicitationRequired => "URL elicitation required",
            Self::UserRejectedSampling => "User rejected sampling request",
            Self::ServerError(_) => "Server error",
        }
    }

    /// Recover the variant from a numeric wire code, where possible.
    pub fn from_code(code: i64) -> Option<Self> {
        Some(match code {
            -32700 => Self::ParseError,
            -32600 => Self::InvalidRequest,
            -32601 => Self::MethodNotFound,
            -32602 => Self::InvalidParams,
            -32603 => Self::InternalError,
            -32002 => Self::ResourceNotFound,
            -32042 => Self::UrlElicitationRequired,
            -1 => Self::UserRejectedSampling,
            c @ -32099..=-32000 => Self::ServerError(c),
            _ => return None,
        })
    }
}

impl fmt::Display for JsonRpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// The `error` object carried by an error [`crate::message::JsonRpcResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorObject {
    pub fn new(code: JsonRpcErrorCode, message: Option<String>, data: Option<Value>) -> Self {
        Self {
            code: code.code(),
            message: message.unwrap_or_else(|| code.message().to_string()),
            data,
        }
    }

    pub fn parse_error() -> Self {
        Self::new(JsonRpcErrorCode::ParseError, None, None)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(JsonRpcErrorCode::InvalidRequest, Some(message.into()), None)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            JsonRpcErrorCode::MethodNotFound,
            Some(format!("Method '{method}' not found")),
            None,
        )
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(JsonRpcErrorCode::InvalidParams, Some(message.into()), None)
    }

    pub fn internal_error(message: Option<String>, data: Option<Value>) -> Self {
        Self::new(JsonRpcErrorCode::InternalError, message, data)
    }
}

impl fmt::Display for JsonRpcErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for JsonRpcErrorObject {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for code in [
            JsonRpcErrorCode::ParseError,
            JsonRpcErrorCode::InvalidRequest,
            JsonRpcErrorCode::MethodNotFound,
            JsonRpcErrorCode::InvalidParams,
            JsonRpcErrorCode::InternalError,
            JsonRpcErrorCode::ResourceNotFound,
            JsonRpcErrorCode::UrlElicitationRequired,
            JsonRpcErrorCode::UserRejectedSampling,
        ] {
            assert_eq!(JsonRpcErrorCode::from_code(code.code()), Some(code));
        }
    }

    #[test]
    fn server_error_range() {
        assert_eq!(
            JsonRpcErrorCode::from_code(-32050),
            Some(JsonRpcErrorCode::ServerError(-32050))
        );
        assert_eq!(JsonRpcErrorCode::from_code(-31999), None);
    }

    #[test]
    fn method_not_found_message_includes_method() {
        let obj = JsonRpcErrorObject::method_not_found("tools/call");
        assert!(obj.message.contains("tools/call"));
        assert_eq!(obj.code, -32601);
    }
}
