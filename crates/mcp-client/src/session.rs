//! The client session engine (§4.8): handshake, pending-request correlation,
//! server-initiated request dispatch, and the paginated `list_all_*` helpers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mcp_jsonrpc::{
    JsonRpcErrorObject, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, Message, RequestId,
    ResponseOutcome, classify, encode,
};
use mcp_protocol::{ClientCapabilities, Implementation, InitializeParams, InitializeResult, methods};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock, oneshot};

use mcp_transport::{SendOptions, Transport, TransportEvent, TransportOwner};

use crate::error::McpClientError;
use crate::handlers::{NotificationSink, ServerRequestHandler};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Disconnected,
    Initializing,
    Ready,
    Closed,
}

impl State {
    fn label(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Closed => "closed",
        }
    }
}

pub struct ClientSession {
    transport: Arc<dyn Transport>,
    client_info: Implementation,
    capabilities: ClientCapabilities,
    default_timeout: Duration,
    server_request_handlers: HashMap<String, Arc<dyn ServerRequestHandler>>,
    notification_sink: Option<Arc<dyn NotificationSink>>,

    state: RwLock<State>,
    server: Mutex<Option<InitializeResult>>,
    pending: Mutex<HashMap<RequestId, oneshot::Sender<Result<Value, JsonRpcErrorObject>>>>,
    next_id: AtomicI64,
}

impl ClientSession {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        client_info: Implementation,
        capabilities: ClientCapabilities,
        default_timeout: Duration,
        server_request_handlers: HashMap<String, Arc<dyn ServerRequestHandler>>,
        notification_sink: Option<Arc<dyn NotificationSink>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            transport,
            client_info,
            capabilities,
            default_timeout,
            server_request_handlers,
            notification_sink,
            state: RwLock::new(State::Disconnected),
            server: Mutex::new(None),
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        })
    }

    async fn state(&self) -> State {
        *self.state.read().await
    }

    pub async fn server_info(&self) -> Option<Implementation> {
        self.server.lock().await.as_ref().map(|r| r.server_info.clone())
    }

    pub async fn server_capabilities(&self) -> Option<mcp_protocol::ServerCapabilities> {
        self.server.lock().await.as_ref().map(|r| r.capabilities.clone())
    }

    /// Perform the `initialize` handshake and wait for `ready`.
    pub async fn connect(self: &Arc<Self>) -> Result<(), McpClientError> {
        if self.state().await == State::Ready {
            return Ok(());
        }

        self.transport
            .start(self.clone() as Arc<dyn TransportOwner>)
            .await
            .map_err(McpClientError::Transport)?;

        *self.state.write().await = State::Initializing;

        let params = InitializeParams::new(self.capabilities.clone(), self.client_info.clone());
        let params_value = serde_json::to_value(params)?;
        let result = match self.request(methods::client_to_server::INITIALIZE, Some(params_value)).await {
            Ok(value) => value,
            Err(err) => {
                *self.state.write().await = State::Disconnected;
                return Err(err);
            }
        };

        let initialize_result: InitializeResult = serde_json::from_value(result)?;
        *self.server.lock().await = Some(initialize_result);

        self.notify(methods::notifications::INITIALIZED, None).await;
        *self.state.write().await = State::Ready;
        Ok(())
    }

    pub async fn close(&self) -> Result<(), McpClientError> {
        *self.state.write().await = State::Closed;
        self.transport.close().await.map_err(McpClientError::Transport)
    }

    // --- Outbound primitives ---

    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, McpClientError> {
        let state = self.state().await;
        if method != methods::client_to_server::PING && state != State::Ready && state != State::Initializing {
            return Err(McpClientError::NotReady(state.label()));
        }

        let id = RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id.clone(), tx);

        let request = JsonRpcRequest::new(id.clone(), method, params);
        let value = encode(&Message::Request(request))?;
        if let Err(err) = self.transport.send(value).await {
            self.pending.lock().await.remove(&id);
            return Err(McpClientError::Transport(err));
        }

        match tokio::time::timeout(self.default_timeout, rx).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(err))) => Err(McpClientError::RemoteError(err)),
            Ok(Err(_)) => Err(McpClientError::Closed("transport closed".to_string())),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                if method == methods::client_to_server::INITIALIZE {
                    *self.state.write().await = State::Disconnected;
                }
                Err(McpClientError::Timeout)
            }
        }
    }

    pub async fn notify(&self, method: &str, params: Option<Value>) {
        let notif = JsonRpcNotification::new(method, params);
        if let Ok(value) = encode(&Message::Notification(notif)) {
            if let Err(err) = self.transport.send(value).await {
                tracing::warn!(error = %err, method, "failed to send notification");
            }
        }
    }

    /// Emit `notifications/cancelled`. Advisory only — does not resolve or
    /// drop the local pending waiter for `request_id`.
    pub async fn cancel(&self, request_id: RequestId, reason: Option<String>) {
        let params = serde_json::json!({ "requestId": request_id, "reason": reason });
        self.notify(methods::notifications::CANCELLED, Some(params)).await;
    }

    // --- Pagination helpers ---

    pub async fn list_tools(&self, cursor: Option<String>) -> Result<Value, McpClientError> {
        self.request(methods::client_to_server::TOOLS_LIST, cursor_params(cursor)).await
    }

    pub async fn list_resources(&self, cursor: Option<String>) -> Result<Value, McpClientError> {
        self.request(methods::client_to_server::RESOURCES_LIST, cursor_params(cursor)).await
    }

    pub async fn list_prompts(&self, cursor: Option<String>) -> Result<Value, McpClientError> {
        self.request(methods::client_to_server::PROMPTS_LIST, cursor_params(cursor)).await
    }

    pub async fn call_tool(&self, name: &str, arguments: Option<Value>) -> Result<Value, McpClientError> {
        let params = serde_json::json!({ "name": name, "arguments": arguments });
        self.request(methods::client_to_server::TOOLS_CALL, Some(params)).await
    }

    pub async fn read_resource(&self, uri: &str) -> Result<Value, McpClientError> {
        let params = serde_json::json!({ "uri": uri });
        self.request(methods::client_to_server::RESOURCES_READ, Some(params)).await
    }

    pub async fn get_prompt(&self, name: &str, arguments: Option<Value>) -> Result<Value, McpClientError> {
        let params = serde_json::json!({ "name": name, "arguments": arguments });
        self.request(methods::client_to_server::PROMPTS_GET, Some(params)).await
    }

    /// Walk `nextCursor` until absent, collecting every page's `items` array
    /// (the field name under `items_key`, e.g. `"tools"`, `"resources"`).
    pub async fn list_all(
        &self,
        method: &str,
        items_key: &str,
    ) -> Result<Vec<Value>, McpClientError> {
        let mut items = Vec::new();
        let mut cursor = None;
        loop {
            let page = self.request(method, cursor_params(cursor.clone())).await?;
            if let Some(array) = page.get(items_key).and_then(Value::as_array) {
                items.extend(array.iter().cloned());
            }
            cursor = page.get("nextCursor").and_then(Value::as_str).map(str::to_string);
            if cursor.is_none() {
                break;
            }
        }
        Ok(items)
    }

    // --- Inbound dispatch ---

    async fn dispatch_request(&self, req: JsonRpcRequest) {
        let outcome = match self.server_request_handlers.get(&req.method) {
            Some(handler) => handler.handle(req.params.clone()).await,
            None => Err(JsonRpcErrorObject::method_not_found(&req.method)),
        };
        let response = match outcome {
            Ok(result) => JsonRpcResponse::success(req.id, result),
            Err(err) => JsonRpcResponse::error(req.id, err),
        };
        if let Ok(value) = encode(&Message::Response(response)) {
            if let Err(err) = self.transport.send(value).await {
                tracing::warn!(error = %err, "failed to answer server-initiated request");
            }
        }
    }

    async fn dispatch_notification(&self, notif: JsonRpcNotification) {
        if let Some(sink) = &self.notification_sink {
            sink.notify(&notif.method, notif.params).await;
        } else {
            tracing::debug!(method = %notif.method, "dropping notification: no sink registered");
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
            None => tracing::debug!(id = ?resp.id, "response for unknown pending request"),
        }
    }
}

fn cursor_params(cursor: Option<String>) -> Option<Value> {
    cursor.map(|c| serde_json::json!({ "cursor": c }))
}

#[async_trait]
impl TransportOwner for ClientSession {
    async fn on_transport_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::Message(value) => match classify(value) {
                Ok(Message::Request(req)) => self.dispatch_request(req).await,
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
                tracing::info!(%reason, "client transport closed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ClientBuilder;
    use mcp_protocol::ServerCapabilities;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::mpsc;

    struct MockTransport {
        outbound: mpsc::UnboundedSender<Value>,
        owner: StdMutex<Option<Arc<dyn TransportOwner>>>,
    }

    impl MockTransport {
        fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Value>) {
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

        async fn send_with_opts(&self, message: Value, _opts: SendOptions) -> std::io::Result<()> {
            let _ = self.outbound.send(message);
            Ok(())
        }

        async fn close(&self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn server_initialize_response(id: Value) -> Value {
        let result = InitializeResult::new(
            ServerCapabilities::default(),
            Implementation::new("mock-server", "0.1.0"),
        );
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": result,
        })
    }

    async fn connected_client() -> (Arc<ClientSession>, Arc<MockTransport>, mpsc::UnboundedReceiver<Value>) {
        let (transport, mut rx) = MockTransport::new();
        let session = ClientBuilder::new("test-client", "0.1.0").build(transport.clone());

        let transport_for_task = transport.clone();
        let connect_session = session.clone();
        let connect_task = tokio::spawn(async move { connect_session.connect().await });

        let initialize_req = rx.recv().await.unwrap();
        transport_for_task
            .deliver(server_initialize_response(initialize_req["id"].clone()))
            .await;
        connect_task.await.unwrap().unwrap();

        let _initialized_notification = rx.recv().await.unwrap();
        (session, transport, rx)
    }

    #[tokio::test]
    async fn connect_completes_handshake_and_becomes_ready() {
        let (session, _transport, _rx) = connected_client().await;
        assert_eq!(session.state().await, State::Ready);
        assert_eq!(session.server_info().await.unwrap().name, "mock-server");
    }

    #[tokio::test]
    async fn calls_before_ready_are_rejected() {
        let (transport, _rx) = MockTransport::new();
        let session = ClientBuilder::new("test-client", "0.1.0").build(transport);
        let err = session.list_tools(None).await.unwrap_err();
        assert!(matches!(err, McpClientError::NotReady(_)));
    }

    #[tokio::test]
    async fn list_tools_round_trips() {
        let (session, transport, mut rx) = connected_client().await;

        let session_clone = session.clone();
        let call = tokio::spawn(async move { session_clone.list_tools(None).await });

        let req = rx.recv().await.unwrap();
        transport
            .deliver(serde_json::json!({
                "jsonrpc": "2.0", "id": req["id"].clone(),
                "result": { "tools": [{"name": "echo"}] }
            }))
            .await;

        let result = call.await.unwrap().unwrap();
        assert_eq!(result["tools"][0]["name"], "echo");
    }

    #[tokio::test]
    async fn list_all_walks_next_cursor() {
        let (session, transport, mut rx) = connected_client().await;

        let session_clone = session.clone();
        let call = tokio::spawn(async move { session_clone.list_all("tools/list", "tools").await });

        let first = rx.recv().await.unwrap();
        transport
            .deliver(serde_json::json!({
                "jsonrpc": "2.0", "id": first["id"].clone(),
                "result": { "tools": [{"name": "a"}], "nextCursor": "page2" }
            }))
            .await;

        let second = rx.recv().await.unwrap();
        assert_eq!(second["params"]["cursor"], "page2");
        transport
            .deliver(serde_json::json!({
                "jsonrpc": "2.0", "id": second["id"].clone(),
                "result": { "tools": [{"name": "b"}] }
            }))
            .await;

        let items = call.await.unwrap().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["name"], "a");
        assert_eq!(items[1]["name"], "b");
    }

    #[tokio::test]
    async fn server_initiated_request_is_answered_via_handler_table() {
        let (transport, mut rx) = MockTransport::new();
        let handler: Arc<dyn ServerRequestHandler> =
            Arc::new(|_params: Option<Value>| async move { Ok(serde_json::json!({ "roots": [] })) });
        let session = ClientBuilder::new("test-client", "0.1.0")
            .on_roots(handler)
            .build(transport.clone());

        let connect_session = session.clone();
        let connect_task = tokio::spawn(async move { connect_session.connect().await });
        let initialize_req = rx.recv().await.unwrap();
        transport
            .deliver(server_initialize_response(initialize_req["id"].clone()))
            .await;
        connect_task.await.unwrap().unwrap();
        rx.recv().await.unwrap(); // notifications/initialized

        transport
            .deliver(serde_json::json!({ "jsonrpc": "2.0", "id": "srv-1", "method": "roots/list" }))
            .await;
        let answer = rx.recv().await.unwrap();
        assert_eq!(answer["id"], "srv-1");
        assert_eq!(answer["result"]["roots"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn unregistered_server_method_gets_method_not_found() {
        let (session, transport, _rx0) = connected_client().await;
        let mut rx = _rx0;
        transport
            .deliver(serde_json::json!({ "jsonrpc": "2.0", "id": "srv-2", "method": "sampling/createMessage" }))
            .await;
        let answer = rx.recv().await.unwrap();
        assert_eq!(answer["error"]["code"], -32601);
        let _ = &session;
    }

    #[tokio::test]
    async fn request_times_out_when_no_response_arrives() {
        let (transport, _rx) = MockTransport::new();
        let session = ClientBuilder::new("test-client", "0.1.0")
            .default_timeout(Duration::from_millis(20))
            .build(transport.clone());
        *session.state.write().await = State::Ready;

        let err = session.list_tools(None).await.unwrap_err();
        assert!(matches!(err, McpClientError::Timeout));
    }
}
