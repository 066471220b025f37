//! Fluent client construction. Registering a server-request handler for
//! `sampling/createMessage`, `roots/list`, or `elicitation/create` both wires
//! up the callback and auto-advertises the matching client capability
//! (§4.8); explicit capability overrides win over the auto-derived ones.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use mcp_protocol::{
    ClientCapabilities, ElicitationCapabilities, Implementation, RootsCapabilities,
    SamplingCapabilities, methods,
};
use mcp_transport::Transport;

use crate::handlers::{NotificationSink, ServerRequestHandler};
use crate::session::ClientSession;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ClientBuilder {
    client_info: Implementation,
    capabilities: ClientCapabilities,
    default_timeout: Duration,
    server_request_handlers: HashMap<String, Arc<dyn ServerRequestHandler>>,
    notification_sink: Option<Arc<dyn NotificationSink>>,
}

impl ClientBuilder {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            client_info: Implementation::new(name, version),
            capabilities: ClientCapabilities::default(),
            default_timeout: DEFAULT_TIMEOUT,
            server_request_handlers: HashMap::new(),
            notification_sink: None,
        }
    }

    /// Declare capabilities explicitly. Fields set here win over any
    /// auto-derived from registered handlers.
    pub fn capabilities(mut self, capabilities: ClientCapabilities) -> Self {
        self.capabilities = ClientCapabilities::merge(capabilities, self.capabilities);
        self
    }

    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn on_sampling(mut self, handler: Arc<dyn ServerRequestHandler>) -> Self {
        self.server_request_handlers
            .insert(methods::server_to_client::SAMPLING_CREATE_MESSAGE.to_string(), handler);
        self
    }

    pub fn on_roots(mut self, handler: Arc<dyn ServerRequestHandler>) -> Self {
        self.server_request_handlers
            .insert(methods::server_to_client::ROOTS_LIST.to_string(), handler);
        self
    }

    pub fn on_elicitation(mut self, handler: Arc<dyn ServerRequestHandler>) -> Self {
        self.server_request_handlers
            .insert(methods::server_to_client::ELICITATION_CREATE.to_string(), handler);
        self
    }

    pub fn notifications(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.notification_sink = Some(sink);
        self
    }

    fn auto_capabilities(&self) -> ClientCapabilities {
        let has = |method: &str| self.server_request_handlers.contains_key(method);
        ClientCapabilities {
            sampling: has(methods::server_to_client::SAMPLING_CREATE_MESSAGE)
                .then(SamplingCapabilities::default),
            roots: has(methods::server_to_client::ROOTS_LIST).then(|| RootsCapabilities {
                list_changed: Some(true),
            }),
            elicitation: has(methods::server_to_client::ELICITATION_CREATE).then(|| {
                ElicitationCapabilities {
                    form: Some(true),
                    url: Some(true),
                }
            }),
            experimental: None,
        }
    }

    pub fn build(self, transport: Arc<dyn Transport>) -> Arc<ClientSession> {
        let capabilities = ClientCapabilities::merge(self.capabilities.clone(), self.auto_capabilities());
        ClientSession::new(
            transport,
            self.client_info,
            capabilities,
            self.default_timeout,
            self.server_request_handlers,
            self.notification_sink,
        )
    }
}
