//! Envelope types and the Request/Response/Notification classifier.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::JsonRpcErrorObject;

/// A JSON-RPC id: either an integer or a string. Never null on the wire for
/// a request — `null` ids are rejected by [`classify`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

/// A JSON-RPC request: carries an `id` and expects exactly one response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: RequestId,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: RequestId, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: crate::JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

/// Either `result` (success) or `error` (failure) — never both, never
/// neither.
#[derive(Debug, Clone)]
pub enum ResponseOutcome {
    Result(Value),
    Error(JsonRpcErrorObject),
}

/// A JSON-RPC response: matches a prior request by `id`.
#[derive(Debug, Clone)]
pub struct JsonRpcResponse {
    pub id: RequestId,
    pub outcome: ResponseOutcome,
}

impl JsonRpcResponse {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            id,
            outcome: ResponseOutcome::Result(result),
        }
    }

    pub fn error(id: RequestId, error: JsonRpcErrorObject) -> Self {
        Self {
            id,
            outcome: ResponseOutcome::Error(error),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, ResponseOutcome::Error(_))
    }
}

/// Private wire shape for [`JsonRpcResponse`] — `result` xor `error`, never
/// both serialized, which `serde`'s derive can't express directly for an
/// enum with shared sibling fields.
#[derive(Serialize, Deserialize)]
struct RawResponse {
    jsonrpc: String,
    id: RequestId,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcErrorObject>,
}

impl Serialize for JsonRpcResponse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let raw = match &self.outcome {
            ResponseOutcome::Result(v) => RawResponse {
                jsonrpc: crate::JSONRPC_VERSION.to_string(),
                id: self.id.clone(),
                result: Some(v.clone()),
                error: None,
            },
            ResponseOutcome::Error(e) => RawResponse {
                jsonrpc: crate::JSONRPC_VERSION.to_string(),
                id: self.id.clone(),
                result: None,
                error: Some(e.clone()),
            },
        };
        raw.serialize(serializer)
    }
}

/// A JSON-RPC notification: a request with no `id` and no expected reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: crate::JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

/// The three shapes a decoded JSON-RPC object can take, per MCP's
/// classification rules (no batching).
#[derive(Debug, Clone)]
pub enum Message {
    Request(JsonRpcRequest),
    Response(JsonRpcResponse),
    Notification(JsonRpcNotification),
}

impl Message {
    pub fn related_id(&self) -> Option<&RequestId> {
        match self {
            Self::Request(r) => Some(&r.id),
            Self::Response(r) => Some(&r.id),
            Self::Notification(_) => None,
        }
    }

    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Request(r) => Some(&r.method),
            Self::Notification(n) => Some(&n.method),
            Self::Response(_) => None,
        }
    }
}

/// Serializes any message to a single JSON value. Callers that need newline
/// framing (stdio) or SSE framing append their own delimiter; this function
/// never embeds one.
pub fn encode(message: &Message) -> serde_json::Result<Value> {
    match message {
        Message::Request(r) => serde_json::to_value(r),
        Message::Response(r) => serde_json::to_value(r),
        Message::Notification(n) => serde_json::to_value(n),
    }
}

/// Why a decoded JSON value could not be classified as a well-formed
/// JSON-RPC 2.0 message.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClassifyError {
    #[error("not a JSON object")]
    NotAnObject,
    #[error("missing or invalid 'jsonrpc' field, expected \"2.0\"")]
    BadVersion,
    #[error("a response must carry exactly one of 'result' or 'error', not both or neither")]
    AmbiguousResult,
    #[error("object has neither 'method' nor a response shape ('id' + 'result'/'error')")]
    Unrecognized,
    #[error("invalid request id: {0}")]
    BadId(String),
    #[error("malformed field: {0}")]
    Malformed(String),
}

/// Classify a decoded JSON object into a [`Message`], per §4.1:
///
/// 1. `jsonrpc` must be exactly `"2.0"`.
/// 2. `id` present and exactly one of `result`/`error` present → Response.
/// 3. `id` present and `method` present → Request.
/// 4. `method` present, `id` absent → Notification.
/// 5. Otherwise → error.
pub fn classify(value: Value) -> Result<Message, ClassifyError> {
    let obj = value.as_object().ok_or(ClassifyError::NotAnObject)?;

    match obj.get("jsonrpc").and_then(Value::as_str) {
        Some(v) if v == crate::JSONRPC_VERSION => {}
        _ => return Err(ClassifyError::BadVersion),
    }

    let has_id = obj.contains_key("id") && !obj.get("id").unwrap().is_null();
    let has_result = obj.contains_key("result");
    let has_error = obj.contains_key("error");
    let method = obj.get("method").and_then(Value::as_str);

    if has_id && (has_result ^ has_error) {
        let id = parse_id(obj.get("id").unwrap())?;
        let outcome = if has_result {
            ResponseOutcome::Result(obj.get("result").cloned().unwrap_or(Value::Null))
        } else {
            let error_val = obj.get("error").cloned().unwrap_or(Value::Null);
            let error: JsonRpcErrorObject = serde_json::from_value(error_val)
                .map_err(|e| ClassifyError::Malformed(e.to_string()))?;
            ResponseOutcome::Error(error)
        };
        return Ok(Message::Response(JsonRpcResponse { id, outcome }));
    }

    if has_id && method.is_some() {
        let id = parse_id(obj.get("id").unwrap())?;
        let params = obj.get("params").cloned();
        return Ok(Message::Request(JsonRpcRequest {
            jsonrpc: crate::JSONRPC_VERSION.to_string(),
            id,
            method: method.unwrap().to_string(),
            params,
        }));
    }

    if !has_id && method.is_some() {
        let params = obj.get("params").cloned();
        return Ok(Message::Notification(JsonRpcNotification {
            jsonrpc: crate::JSONRPC_VERSION.to_string(),
            method: method.unwrap().to_string(),
            params,
        }));
    }

    if has_id && has_result && has_error {
        return Err(ClassifyError::AmbiguousResult);
    }

    Err(ClassifyError::Unrecognized)
}

fn parse_id(value: &Value) -> Result<RequestId, ClassifyError> {
    if let Some(n) = value.as_i64() {
        Ok(RequestId::Number(n))
    } else if let Some(s) = value.as_str() {
        Ok(RequestId::String(s.to_string()))
    } else {
        Err(ClassifyError::BadId(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_request() {
        let v = json!({"jsonrpc":"2.0","id":1,"method":"ping","params":{}});
        match classify(v).unwrap() {
            Message::Request(r) => {
                assert_eq!(r.id, RequestId::Number(1));
                assert_eq!(r.method, "ping");
            }
            other => panic!("expected Request, got {other:?}"),
        }
    }

    #[test]
    fn classifies_notification() {
        let v = json!({"jsonrpc":"2.0","method":"notifications/initialized"});
        match classify(v).unwrap() {
            Message::Notification(n) => assert_eq!(n.method, "notifications/initialized"),
            other => panic!("expected Notification, got {other:?}"),
        }
    }

    #[test]
    fn classifies_success_response() {
        let v = json!({"jsonrpc":"2.0","id":2,"result":{"tools":[]}});
        match classify(v).unwrap() {
            Message::Response(r) => {
                assert!(!r.is_error());
                assert_eq!(r.id, RequestId::Number(2));
            }
            other => panic!("expected Response, got {other:?}"),
        }
    }

    #[test]
    fn classifies_error_response() {
        let v = json!({"jsonrpc":"2.0","id":"abc","error":{"code":-32601,"message":"Method not found"}});
        match classify(v).unwrap() {
            Message::Response(r) => {
                assert!(r.is_error());
                assert_eq!(r.id, RequestId::String("abc".to_string()));
            }
            other => panic!("expected Response, got {other:?}"),
        }
    }

    #[test]
    fn rejects_wrong_version() {
        let v = json!({"jsonrpc":"1.0","id":1,"method":"ping"});
        assert!(matches!(classify(v), Err(ClassifyError::BadVersion)));
    }

    #[test]
    fn rejects_both_result_and_error() {
        let v = json!({"jsonrpc":"2.0","id":1,"result":{},"error":{"code":-1,"message":"x"}});
        assert!(matches!(classify(v), Err(ClassifyError::AmbiguousResult)));
    }

    #[test]
    fn rejects_neither_method_nor_response_shape() {
        let v = json!({"jsonrpc":"2.0","id":1});
        assert!(matches!(classify(v), Err(ClassifyError::Unrecognized)));
    }

    #[test]
    fn rejects_null_id_as_notification_even_with_method() {
        // A null id plus a method is still a notification by presence rules.
        let v = json!({"jsonrpc":"2.0","id":null,"method":"ping"});
        match classify(v).unwrap() {
            Message::Notification(n) => assert_eq!(n.method, "ping"),
            other => panic!("expected Notification, got {other:?}"),
        }
    }

    #[test]
    fn encode_then_classify_round_trips_request() {
        let original = Message::Request(JsonRpcRequest::new(
            RequestId::Number(7),
            "tools/list",
            Some(json!({"cursor": null})),
        ));
        let encoded = encode(&original).unwrap();
        let decoded = classify(encoded).unwrap();
        match decoded {
            Message::Request(r) => {
                assert_eq!(r.id, RequestId::Number(7));
                assert_eq!(r.method, "tools/list");
            }
            other => panic!("expected Request, got {other:?}"),
        }
    }

    #[test]
    fn encode_then_classify_round_trips_response() {
        let original = JsonRpcResponse::success(RequestId::String("r1".into()), json!({"ok": true}));
        let encoded = encode(&Message::Response(original)).unwrap();
        let decoded = classify(encoded).unwrap();
        match decoded {
            Message::Response(r) => assert!(!r.is_error()),
            other => panic!("expected Response, got {other:?}"),
        }
    }
}
