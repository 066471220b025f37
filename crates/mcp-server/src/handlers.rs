//! The handler surface a server is built from. Which `Option<Arc<dyn ...>>`
//! slots a [`crate::builder::ServerBuilder`] is given drives capability
//! auto-detection (§4.9) — there is no separate "declare your capabilities"
//! step.

use async_trait::async_trait;
use mcp_jsonrpc::JsonRpcErrorObject;
use serde_json::Value;

use crate::tool_context::ToolContext;

/// What a `tools/call` handler did with the call.
pub enum ToolOutcome {
    /// The handler ran synchronously and has a result (or error) ready now.
    Immediate(Result<Value, JsonRpcErrorObject>),
    /// The handler spawned a background task that will emit its own
    /// response (and possibly intermediate notifications/requests) through
    /// the [`ToolContext`] it was given. The engine emits nothing further
    /// for this request.
    Spawned,
}

#[async_trait]
pub trait ToolsHandler: Send + Sync {
    async fn list_tools(&self, cursor: Option<String>) -> Result<Value, JsonRpcErrorObject>;
    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Value>,
        context: ToolContext,
    ) -> ToolOutcome;
}

#[async_trait]
pub trait ResourcesHandler: Send + Sync {
    async fn list_resources(&self, cursor: Option<String>) -> Result<Value, JsonRpcErrorObject>;
    async fn read_resource(&self, uri: &str) -> Result<Value, JsonRpcErrorObject>;

    /// Only called when the server was built with subscriptions enabled
    /// (`ServerBuilder::resources_with_subscribe`); the default rejects.
    async fn subscribe(&self, uri: &str) -> Result<Value, JsonRpcErrorObject> {
        Err(JsonRpcErrorObject::method_not_found(&format!(
            "resources/subscribe({uri})"
        )))
    }

    /// Mirrors [`Self::subscribe`]; only called when subscriptions are
    /// enabled, the default rejects.
    async fn unsubscribe(&self, uri: &str) -> Result<Value, JsonRpcErrorObject> {
        Err(JsonRpcErrorObject::method_not_found(&format!(
            "resources/unsubscribe({uri})"
        )))
    }

    /// Lists resource templates. Shares `list_resources`' paginated-result
    /// shape (`{"resourceTemplates": [...], "nextCursor": ...}`).
    async fn list_resource_templates(&self, cursor: Option<String>) -> Result<Value, JsonRpcErrorObject> {
        let _ = cursor;
        Ok(serde_json::json!({ "resourceTemplates": [] }))
    }
}

#[async_trait]
pub trait PromptsHandler: Send + Sync {
    async fn list_prompts(&self, cursor: Option<String>) -> Result<Value, JsonRpcErrorObject>;
    async fn get_prompt(
        &self,
        name: &str,
        arguments: Option<Value>,
    ) -> Result<Value, JsonRpcErrorObject>;
}

#[async_trait]
pub trait CompletionsHandler: Send + Sync {
    async fn complete(&self, params: Value) -> Result<Value, JsonRpcErrorObject>;
}
