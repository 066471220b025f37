//! The handle an async-capable tool handler uses to talk back to its
//! originating request while it runs on its own task (§4.10).

use std::sync::Arc;

use mcp_jsonrpc::{JsonRpcErrorObject, RequestId};
use mcp_protocol::Meta;
use mcp_protocol::LoggingLevel;
use serde_json::Value;

use crate::error::McpServerError;
use crate::session::ServerSession;

#[derive(Clone)]
pub struct ToolContext {
    session: Arc<ServerSession>,
    request_id: RequestId,
    meta: Meta,
}

impl ToolContext {
    pub(crate) fn new(session: Arc<ServerSession>, request_id: RequestId, meta: Meta) -> Self {
        Self {
            session,
            request_id,
            meta,
        }
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Emit a `notifications/message` log entry, gated by the session's
    /// logging threshold, routed to the stream bound to this call.
    pub async fn log(&self, level: LoggingLevel, data: Value) {
        self.session
            .emit_log(level, data, Some(self.request_id.clone()))
            .await;
    }

    /// Emit `notifications/progress` using `_meta.progressToken` (or `0`).
    pub async fn send_progress(&self, progress: Value) {
        let params = serde_json::json!({
            "progressToken": self.meta.progress_token(),
            "progress": progress,
        });
        self.session
            .notify_related("notifications/progress", Some(params), self.request_id.clone())
            .await;
    }

    /// Send an arbitrary notification related to this call.
    pub async fn notify(&self, method: &str, params: Option<Value>) {
        self.session
            .notify_related(method, params, self.request_id.clone())
            .await;
    }

    /// Issue `sampling/createMessage` to the client and block for its reply.
    pub async fn request_sampling(&self, params: Value) -> Result<Value, McpServerError> {
        self.session
            .server_initiated_request(
                mcp_protocol::methods::server_to_client::SAMPLING_CREATE_MESSAGE,
                Some(params),
                self.request_id.clone(),
            )
            .await
    }

    /// Issue `elicitation/create` to the client and block for its reply.
    pub async fn request_elicitation(&self, params: Value) -> Result<Value, McpServerError> {
        self.session
            .server_initiated_request(
                mcp_protocol::methods::server_to_client::ELICITATION_CREATE,
                Some(params),
                self.request_id.clone(),
            )
            .await
    }

    /// Issue `roots/list` to the client and block for its reply.
    pub async fn request_roots(&self) -> Result<Value, McpServerError> {
        self.session
            .server_initiated_request(
                mcp_protocol::methods::server_to_client::ROOTS_LIST,
                None,
                self.request_id.clone(),
            )
            .await
    }

    /// Emit the final response for the call this context belongs to. Must
    /// be called exactly once by a spawned handler task.
    pub async fn respond(&self, outcome: Result<Value, JsonRpcErrorObject>) {
        self.session
            .send_response(self.request_id.clone(), outcome)
            .await;
    }
}
