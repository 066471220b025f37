//! Callback tables a client registers for server-initiated requests and
//! notifications (§4.8). Registering a callback both satisfies the method it
//! answers and, per §4.8's auto-advertisement rule, drives which client
//! capabilities [`crate::builder::ClientBuilder`] declares.

use async_trait::async_trait;
use mcp_jsonrpc::JsonRpcErrorObject;
use serde_json::Value;

/// Answers one server-initiated method (`sampling/createMessage`,
/// `roots/list`, `elicitation/create`, or any experimental method a peer may
/// send).
#[async_trait]
pub trait ServerRequestHandler: Send + Sync {
    async fn handle(&self, params: Option<Value>) -> Result<Value, JsonRpcErrorObject>;
}

#[async_trait]
impl<F, Fut> ServerRequestHandler for F
where
    F: Fn(Option<Value>) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<Value, JsonRpcErrorObject>> + Send,
{
    async fn handle(&self, params: Option<Value>) -> Result<Value, JsonRpcErrorObject> {
        (self)(params).await
    }
}

/// Receives notifications the engine could not resolve against a pending
/// request (change notifications, progress, log messages).
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, method: &str, params: Option<Value>);
}

#[async_trait]
impl<F> NotificationSink for F
where
    F: Fn(&str, Option<Value>) + Send + Sync,
{
    async fn notify(&self, method: &str, params: Option<Value>) {
        (self)(method, params)
    }
}
