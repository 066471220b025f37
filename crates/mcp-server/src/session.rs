//! The server session engine (§4.9): handshake, capability auto-detection,
//! static method routing, and the server-initiated-request correlator that
//! also backs [`crate::tool_context::ToolContext`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use mcp_jsonrpc::{
    JsonRpcErrorObject, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, Message,
    RequestId, ResponseOutcome, classify, encode,
};
use mcp_protocol::{
    ClientCapabilities, Implementation, InitializeParams, InitializeResult, LoggingLevel, Meta,
    ServerCapabilities, methods,
};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock, oneshot};

use mcp_transport::{SendOptions, Transport, TransportEvent, TransportOwner};

use crate::error::McpServerError;
use crate::handlers::ToolOutcome;
use crate::tool_context::ToolContext;

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Waiting,
    Ready,
    Closed,
}

pub(crate) struct Handlers {
    pub tools: Option<Arc<dyn crate::handlers::ToolsHandler>>,
    pub resources: Option<Arc<dyn crate::handlers::ResourcesHandler>>,
    pub resources_subscribe: bool,
    pub prompts: Option<Arc<dyn crate::handlers::PromptsHandler>>,
    pub completions: Option<Arc<dyn crate::handlers::CompletionsHandler>>,
    pub logging: bool,
}

pub struct ServerSession {
    transport: Arc<dyn Transport>,
    handlers: Handlers,
    capabilities: ServerCapabilities,
    server_info: Implementation,
    instructions: Option<String>,
    default_timeout: Duration,

    state: RwLock<State>,
    client: Mutex<Option<(ClientCapabilities, Implementation)>>,
    log_threshold: Mutex<Option<LoggingLevel>>,
    pending: Mutex<HashMap<RequestId, oneshot::Sender<Result<Value, JsonRpcErrorObject>>>>,
    next_id: AtomicI64,
    self_ref: Weak<ServerSession>,
}

impl ServerSession {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        handlers: Handlers,
        capabilities: ServerCapabilities,
        server_info: Implementation,
        instructions: Option<String>,
        default_timeout: Duration,
    ) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            transport,
            handlers,
            capabilities,
            server_info,
            instructions,
            default_timeout,
            state: RwLock::new(State::Waiting),
            client: Mutex::new(None),
            log_threshold: Mutex::new(None),
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            self_ref: self_ref.clone(),
        })
    }

    fn arc(&self) -> Arc<ServerSession> {
        self.self_ref
            .upgrade()
            .expect("ServerSession always outlives its own Weak self-reference")
    }

    /// Wire this session up as the transport's event sink and start it.
    pub async fn start(self: &Arc<Self>) -> Result<(), McpServerError> {
        self.transport
            .start(self.clone() as Arc<dyn TransportOwner>)
            .await
            .map_err(McpServerError::Transport)
    }

    pub async fn client_info(&self) -> Option<Implementation> {
        self.client.lock().await.as_ref().map(|(_, info)| info.clone())
    }

    async fn is_ready(&self) -> bool {
        *self.state.read().await == State::Ready
    }

    // --- Outbound primitives, shared by notifications and ToolContext ---

    pub async fn notify(&self, method: &str, params: Option<Value>) {
        if !self.is_ready().await {
            return;
        }
        let notif = JsonRpcNotification::new(method, params);
        if let Ok(value) = encode(&Message::Notification(notif)) {
            if let Err(err) = self.transport.send(value).await {
                tracing::warn!(error = %err, method, "failed to send notification");
            }
        }
    }

    pub(crate) async fn notify_related(&self, method: &str, params: Option<Value>, related: RequestId) {
        if !self.is_ready().await {
            return;
        }
        let notif = JsonRpcNotification::new(method, params);
        if let Ok(value) = encode(&Message::Notification(notif)) {
            let opts = SendOptions::related_to(related);
            if let Err(err) = self.transport.send_with_opts(value, opts).await {
                tracing::warn!(error = %err, method, "failed to send related notification");
            }
        }
    }

    pub(crate) async fn emit_log(&self, level: LoggingLevel, data: Value, related: Option<RequestId>) {
        let threshold = *self.log_threshold.lock().await;
        let Some(threshold) = threshold else {
            return;
        };
        if !level.should_log(threshold) {
            return;
        }
        let params = serde_json::json!({ "level": level, "data": data });
        match related {
            Some(id) => self.notify_related(methods::notifications::MESSAGE, Some(params), id).await,
            None => self.notify(methods::notifications::MESSAGE, Some(params)).await,
        }
    }

    pub(crate) async fn send_response(&self, id: RequestId, outcome: Result<Value, JsonRpcErrorObject>) {
        let response = match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => JsonRpcResponse::error(id, err),
        };
        match encode(&Message::Response(response)) {
            Ok(value) => {
                if let Err(err) = self.transport.send(value).await {
                    tracing::warn!(error = %err, "failed to send response");
                }
            }
            Err(err) => tracing::warn!(error = %err, "failed to encode response"),
        }
    }

    /// Issue a server-initiated request (`sampling/createMessage`,
    /// `roots/list`, `elicitation/create`) tagged to the originating client
    /// request `related`, and block until the response arrives or times out.
    pub(crate) async fn server_initiated_request(
        &self,
        method: &str,
        params: Option<Value>,
        related: RequestId,
    ) -> Result<Value, McpServerError> {
        let id = RequestId::String(format!("srv-{}", self.next_id.fetch_add(1, Ordering::SeqCst)));
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id.clone(), tx);

        let request = JsonRpcRequest::new(id.clone(), method, params);
        let value = encode(&Message::Request(request))?;
        self.transport
            .send_with_opts(value, SendOptions::related_to(related))
            .await
            .map_err(McpServerError::Transport)?;

        match tokio::time::timeout(self.default_timeout, rx).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(err))) => Err(McpServerError::RemoteError(err)),
            Ok(Err(_)) => {
                self.pending.lock().await.remove(&id);
                Err(McpServerError::Closed("transport closed".to_string()))
            }
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(McpServerError::Timeout)
            }
        }
    }

    // --- Inbound dispatch ---

    async fn dispatch_request(self: &Arc<Self>, req: JsonRpcRequest) {
        if req.method == methods::client_to_server::PING {
            self.send_response(req.id, Ok(serde_json::json!({}))).await;
            return;
        }

        if req.method == methods::client_to_server::INITIALIZE {
            self.handle_initialize(req).await;
            return;
        }

        if !self.is_ready().await {
            self.send_response(
                req.id,
                Err(JsonRpcErrorObject::invalid_request("session is not initialized")),
            )
            .await;
            return;
        }

        match req.method.as_str() {
            methods::client_to_server::TOOLS_LIST => {
                let cursor = cursor_of(&req);
                let outcome = match &self.handlers.tools {
                    Some(h) => h.list_tools(cursor).await,
                    None => Err(JsonRpcErrorObject::method_not_found(&req.method)),
                };
                self.send_response(req.id, outcome).await;
            }
            methods::client_to_server::TOOLS_CALL => self.handle_tools_call(req).await,
            methods::client_to_server::RESOURCES_LIST => {
                let cursor = cursor_of(&req);
                let outcome = match &self.handlers.resources {
                    Some(h) => h.list_resources(cursor).await,
                    None => Err(JsonRpcErrorObject::method_not_found(&req.method)),
                };
                self.send_response(req.id, outcome).await;
            }
            methods::client_to_server::RESOURCES_READ => {
                let uri = req
                    .params
                    .as_ref()
                    .and_then(|p| p.get("uri"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let outcome = match &self.handlers.resources {
                    Some(h) => h.read_resource(&uri).await,
                    None => Err(JsonRpcErrorObject::method_not_found(&req.method)),
                };
                self.send_response(req.id, outcome).await;
            }
            methods::client_to_server::RESOURCES_SUBSCRIBE => {
                let uri = req
                    .params
                    .as_ref()
                    .and_then(|p| p.get("uri"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let outcome = match (&self.handlers.resources, self.handlers.resources_subscribe) {
                    (Some(h), true) => h.subscribe(&uri).await,
                    _ => Err(JsonRpcErrorObject::method_not_found(&req.method)),
                };
                self.send_response(req.id, outcome).await;
            }
            methods::client_to_server::RESOURCES_UNSUBSCRIBE => {
                let uri = req
                    .params
                    .as_ref()
                    .and_then(|p| p.get("uri"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let outcome = match (&self.handlers.resources, self.handlers.resources_subscribe) {
                    (Some(h), true) => h.unsubscribe(&uri).await,
                    _ => Err(JsonRpcErrorObject::method_not_found(&req.method)),
                };
                self.send_response(req.id, outcome).await;
            }
            methods::client_to_server::RESOURCES_TEMPLATES_LIST => {
                let cursor = cursor_of(&req);
                let outcome = match &self.handlers.resources {
                    Some(h) => h.list_resource_templates(cursor).await,
                    None => Err(JsonRpcErrorObject::method_not_found(&req.method)),
                };
                self.send_response(req.id, outcome).await;
            }
            methods::client_to_server::PROMPTS_LIST => {
                let cursor = cursor_of(&req);
                let outcome = match &self.handlers.prompts {
                    Some(h) => h.list_prompts(cursor).await,
                    None => Err(JsonRpcErrorObject::method_not_found(&req.method)),
                };
                self.send_response(req.id, outcome).await;
            }
            methods::client_to_server::PROMPTS_GET => {
                let name = req
                    .params
                    .as_ref()
                    .and_then(|p| p.get("name"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let arguments = req.params.as_ref().and_then(|p| p.get("arguments")).cloned();
                let outcome = match &self.handlers.prompts {
                    Some(h) => h.get_prompt(&name, arguments).await,
                    None => Err(JsonRpcErrorObject::method_not_found(&req.method)),
                };
                self.send_response(req.id, outcome).await;
            }
            methods::client_to_server::LOGGING_SET_LEVEL => {
                let outcome = if self.handlers.logging {
                    match req
                        .params
                        .as_ref()
                        .and_then(|p| p.get("level"))
                        .and_then(|v| serde_json::from_value::<LoggingLevel>(v.clone()).ok())
                    {
                        Some(level) => {
                            *self.log_threshold.lock().await = Some(level);
                            Ok(serde_json::json!({}))
                        }
                        None => Err(JsonRpcErrorObject::invalid_params("missing or invalid 'level'")),
                    }
                } else {
                    Err(JsonRpcErrorObject::method_not_found(&req.method))
                };
                self.send_response(req.id, outcome).await;
            }
            methods::client_to_server::COMPLETION_COMPLETE => {
                let params = req.params.clone().unwrap_or(Value::Null);
                let outcome = match &self.handlers.completions {
                    Some(h) => h.complete(params).await,
                    None => Err(JsonRpcErrorObject::method_not_found(&req.method)),
                };
                self.send_response(req.id, outcome).await;
            }
            _ => {
                self.send_response(req.id, Err(JsonRpcErrorObject::method_not_found(&req.method)))
                    .await;
            }
        }
    }

    async fn handle_initialize(self: &Arc<Self>, req: JsonRpcRequest) {
        let state = self.state.read().await.clone();
        if state != State::Waiting {
            self.send_response(
                req.id,
                Err(JsonRpcErrorObject::invalid_request("already initialized")),
            )
            .await;
            return;
        }

        let params: InitializeParams = match req.params.clone().map(serde_json::from_value) {
            Some(Ok(p)) => p,
            _ => {
                self.send_response(req.id, Err(JsonRpcErrorObject::invalid_params("malformed initialize params")))
                    .await;
                return;
            }
        };

        let negotiated = InitializeResult::negotiate_version(&params.protocol_version);
        *self.client.lock().await = Some((params.capabilities, params.client_info));

        let mut result = InitializeResult::new(self.capabilities.clone(), self.server_info.clone());
        result.protocol_version = negotiated;
        if let Some(instructions) = &self.instructions {
            result = result.with_instructions(instructions.clone());
        }

        let value = match serde_json::to_value(result) {
            Ok(v) => v,
            Err(err) => {
                tracing::error!(error = %err, "failed to encode initialize result");
                return;
            }
        };
        self.send_response(req.id, Ok(value)).await;
    }

    async fn handle_tools_call(self: &Arc<Self>, req: JsonRpcRequest) {
        let Some(handler) = self.handlers.tools.clone() else {
            self.send_response(req.id, Err(JsonRpcErrorObject::method_not_found(&req.method)))
                .await;
            return;
        };

        let name = req
            .params
            .as_ref()
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let arguments = req.params.as_ref().and_then(|p| p.get("arguments")).cloned();
        let meta = Meta::from_params(req.params.as_ref());

        let context = ToolContext::new(self.clone(), req.id.clone(), meta);
        match handler.call_tool(&name, arguments, context).await {
            ToolOutcome::Immediate(outcome) => self.send_response(req.id, outcome).await,
            ToolOutcome::Spawned => {
                tracing::debug!(tool = %name, "tool call spawned an async task");
            }
        }
    }

    async fn dispatch_notification(&self, notif: JsonRpcNotification) {
        match notif.method.as_str() {
            methods::notifications::INITIALIZED => {
                if *self.state.read().await == State::Waiting {
                    *self.state.write().await = State::Ready;
                    tracing::info!("session transitioned to ready");
                }
            }
            methods::notifications::CANCELLED => {
                tracing::debug!(params = ?notif.params, "received cancellation notice");
            }
            _ => {
                tracing::debug!(method = %notif.method, "ignoring unhandled notification");
            }
        }
    }

    async fn dispatch_response(&self, resp: JsonRpcResponse) {
        let sender = self.pending.lock().await.remove(&resp.id);
        match sender {
            Some(tx) => {
                let outcome = match resp.outcome {
                    ResponseOutcome::Result(v) => Ok(v),
                    ResponseOutcome::Error(e) => Err(e),
                };
                let _ = tx.send(outcome);
            }
            None => tracing::debug!(id = ?resp.id, "response for unknown pending server-initiated request"),
        }
    }
}

fn cursor_of(req: &JsonRpcRequest) -> Option<String> {
    req.params
        .as_ref()
        .and_then(|p| p.get("cursor"))
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}

#[async_trait]
impl TransportOwner for ServerSession {
    async fn on_transport_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::Message(value) => match classify(value) {
                Ok(Message::Request(req)) => {
                    self.arc().dispatch_request(req).await;
                }
                Ok(Message::Notification(notif)) => self.dispatch_notification(notif).await,
                Ok(Message::Response(resp)) => self.dispatch_response(resp).await,
                Err(err) => tracing::warn!(error = %err, "dropping unclassifiable inbound message"),
            },
            TransportEvent::Closed(reason) => {
                *self.state.write().await = State::Closed;
                let mut pending = self.pending.lock().await;
                for (_, tx) in pending.drain() {
                    let _ = tx.send(Err(JsonRpcErrorObject::internal_error(
                        Some("transport closed".to_string()),
                        None,
                    )));
                }
                tracing::info!(%reason, "session transport closed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ServerBuilder;
    use crate::handlers::{ToolOutcome, ToolsHandler};
    use std::sync::Mutex as StdMutex;
    use tokio::sync::mpsc;

    struct MockTransport {
        outbound: mpsc::UnboundedSender<(Value, SendOptions)>,
        owner: StdMutex<Option<Arc<dyn TransportOwner>>>,
    }

    impl MockTransport {
        fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<(Value, SendOptions)>) {
            let (tx, rx) = mpsc::unbounded_channel();
            (
                Arc::new(Self {
                    outbound: tx,
                    owner: StdMutex::new(None),
                }),
                rx,
            )
        }

        async fn deliver(&self, value: Value) {
            let owner = self.owner.lock().unwrap().clone();
            if let Some(owner) = owner {
                owner.on_transport_event(TransportEvent::Message(value)).await;
            }
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn start(&self, owner: Arc<dyn TransportOwner>) -> std::io::Result<()> {
            *self.owner.lock().unwrap() = Some(owner);
            Ok(())
        }

        async fn send_with_opts(&self, message: Value, opts: SendOptions) -> std::io::Result<()> {
            let _ = self.outbound.send((message, opts));
            Ok(())
        }

        async fn close(&self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct EchoTools;

    #[async_trait]
    impl ToolsHandler for EchoTools {
        async fn list_tools(&self, _cursor: Option<String>) -> Result<Value, JsonRpcErrorObject> {
            Ok(serde_json::json!({ "tools": [] }))
        }

        async fn call_tool(
            &self,
            name: &str,
            arguments: Option<Value>,
            _context: ToolContext,
        ) -> ToolOutcome {
            ToolOutcome::Immediate(Ok(serde_json::json!({ "echoed": name, "arguments": arguments })))
        }
    }

    fn init_request() -> Value {
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": mcp_protocol::PROTOCOL_VERSION,
                "capabilities": ClientCapabilities::default(),
                "clientInfo": Implementation::new("test-client", "0.1.0"),
            }
        })
    }

    fn initialized_notification() -> Value {
        serde_json::json!({ "jsonrpc": "2.0", "method": "notifications/initialized" })
    }

    async fn ready_session() -> (Arc<ServerSession>, mpsc::UnboundedReceiver<(Value, SendOptions)>) {
        let (transport, mut rx) = MockTransport::new();
        let session = ServerBuilder::new("test-server", "0.1.0")
            .tools(Arc::new(EchoTools))
            .build(transport.clone());
        session.start().await.unwrap();

        transport.deliver(init_request()).await;
        let (resp, _) = rx.recv().await.unwrap();
        assert_eq!(resp["result"]["protocolVersion"], mcp_protocol::PROTOCOL_VERSION);

        transport.deliver(initialized_notification()).await;
        (session, rx)
    }

    #[tokio::test]
    async fn auto_detects_tools_capability_only() {
        let (transport, _rx) = MockTransport::new();
        let session = ServerBuilder::new("test-server", "0.1.0")
            .tools(Arc::new(EchoTools))
            .build(transport);
        assert!(session.capabilities.tools.is_some());
        assert!(session.capabilities.resources.is_none());
        assert!(session.capabilities.prompts.is_none());
    }

    #[tokio::test]
    async fn initialize_then_initialized_reaches_ready() {
        let (session, _rx) = ready_session().await;
        assert!(session.is_ready().await);
    }

    #[tokio::test]
    async fn duplicate_initialize_is_rejected() {
        let (transport, mut rx) = MockTransport::new();
        let session = ServerBuilder::new("test-server", "0.1.0").build(transport.clone());
        session.start().await.unwrap();

        transport.deliver(init_request()).await;
        rx.recv().await.unwrap();

        transport
            .deliver(serde_json::json!({
                "jsonrpc": "2.0", "id": 2, "method": "initialize",
                "params": { "protocolVersion": "2025-11-25", "capabilities": {}, "clientInfo": {"name": "x", "version": "1"} }
            }))
            .await;
        let (resp, _) = rx.recv().await.unwrap();
        assert_eq!(resp["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn ping_is_answered_before_ready() {
        let (transport, mut rx) = MockTransport::new();
        let session = ServerBuilder::new("test-server", "0.1.0").build(transport.clone());
        session.start().await.unwrap();

        transport
            .deliver(serde_json::json!({ "jsonrpc": "2.0", "id": 9, "method": "ping" }))
            .await;
        let (resp, _) = rx.recv().await.unwrap();
        assert_eq!(resp["id"], 9);
        assert!(resp.get("result").is_some());
    }

    #[tokio::test]
    async fn requests_before_ready_are_rejected() {
        let (transport, mut rx) = MockTransport::new();
        let session = ServerBuilder::new("test-server", "0.1.0")
            .tools(Arc::new(EchoTools))
            .build(transport.clone());
        session.start().await.unwrap();

        transport
            .deliver(serde_json::json!({ "jsonrpc": "2.0", "id": 3, "method": "tools/list" }))
            .await;
        let (resp, _) = rx.recv().await.unwrap();
        assert_eq!(resp["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn tools_call_sync_path_emits_response() {
        let (session, mut rx) = ready_session().await;

        session
            .on_transport_event(TransportEvent::Message(serde_json::json!({
                "jsonrpc": "2.0", "id": 10, "method": "tools/call",
                "params": { "name": "echo", "arguments": {"x": 1} }
            })))
            .await;

        let (resp, _) = rx.recv().await.unwrap();
        assert_eq!(resp["result"]["echoed"], "echo");
    }

    #[tokio::test]
    async fn tools_call_without_handler_is_method_not_found() {
        let (transport, mut rx) = MockTransport::new();
        let session = ServerBuilder::new("test-server", "0.1.0").build(transport.clone());
        session.start().await.unwrap();
        transport.deliver(init_request()).await;
        rx.recv().await.unwrap();
        transport.deliver(initialized_notification()).await;

        transport
            .deliver(serde_json::json!({
                "jsonrpc": "2.0", "id": 11, "method": "tools/call",
                "params": { "name": "echo" }
            }))
            .await;
        let (resp, _) = rx.recv().await.unwrap();
        assert_eq!(resp["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn logging_gates_on_threshold() {
        let (transport, mut rx) = MockTransport::new();
        let session = ServerBuilder::new("test-server", "0.1.0")
            .logging(true)
            .build(transport.clone());
        session.start().await.unwrap();
        transport.deliver(init_request()).await;
        rx.recv().await.unwrap();
        transport.deliver(initialized_notification()).await;

        // No threshold set yet: emit_log is a no-op.
        session
            .emit_log(LoggingLevel::Error, serde_json::json!("boom"), None)
            .await;
        assert!(rx.try_recv().is_err());

        transport
            .deliver(serde_json::json!({
                "jsonrpc": "2.0", "id": 20, "method": "logging/setLevel",
                "params": { "level": "warning" }
            }))
            .await;
        let (resp, _) = rx.recv().await.unwrap();
        assert!(resp.get("result").is_some());

        session
            .emit_log(LoggingLevel::Debug, serde_json::json!("quiet"), None)
            .await;
        assert!(rx.try_recv().is_err());

        session
            .emit_log(LoggingLevel::Error, serde_json::json!("loud"), None)
            .await;
        let (notif, _) = rx.recv().await.unwrap();
        assert_eq!(notif["method"], "notifications/message");
    }

    #[tokio::test]
    async fn server_initiated_request_round_trips_through_pending_table() {
        let (transport, mut rx) = MockTransport::new();
        let session = ServerBuilder::new("test-server", "0.1.0").build(transport.clone());
        session.start().await.unwrap();
        transport.deliver(init_request()).await;
        rx.recv().await.unwrap();
        transport.deliver(initialized_notification()).await;

        let related = RequestId::Number(1);
        let session_clone = session.clone();
        let handle = tokio::spawn(async move {
            session_clone
                .server_initiated_request("roots/list", None, related)
                .await
        });

        let (outbound, _opts) = rx.recv().await.unwrap();
        let id = outbound["id"].clone();
        transport
            .deliver(serde_json::json!({ "jsonrpc": "2.0", "id": id, "result": { "roots": [] } }))
            .await;

        let result = handle.await.unwrap().unwrap();
        assert_eq!(result["roots"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn server_initiated_request_times_out() {
        let (transport, mut rx) = MockTransport::new();
        let session = ServerBuilder::new("test-server", "0.1.0")
            .default_timeout(Duration::from_millis(20))
            .build(transport.clone());
        session.start().await.unwrap();
        transport.deliver(init_request()).await;
        rx.recv().await.unwrap();
        transport.deliver(initialized_notification()).await;

        let err = session
            .server_initiated_request("roots/list", None, RequestId::Number(1))
            .await
            .unwrap_err();
        assert!(matches!(err, McpServerError::Timeout));
    }
}
