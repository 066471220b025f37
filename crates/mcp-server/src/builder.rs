//! Fluent server construction with capability auto-detection (§4.9): the
//! `ServerCapabilities` a session advertises follow directly from which
//! handler slots were registered, mirroring the teacher's `builder.rs`
//! pattern of deriving capability flags from `!self.tools.is_empty()`-style
//! presence checks rather than a separate declaration step.

use std::sync::Arc;
use std::time::Duration;

use mcp_protocol::{
    CompletionsCapabilities, Implementation, LoggingCapabilities, PromptsCapabilities,
    ResourcesCapabilities, ServerCapabilities, ToolsCapabilities,
};
use mcp_transport::Transport;

use crate::handlers::{CompletionsHandler, PromptsHandler, ResourcesHandler, ToolsHandler};
use crate::session::{Handlers, ServerSession};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub struct ServerBuilder {
    server_info: Implementation,
    instructions: Option<String>,
    tools: Option<Arc<dyn ToolsHandler>>,
    resources: Option<Arc<dyn ResourcesHandler>>,
    resources_subscribe: bool,
    prompts: Option<Arc<dyn PromptsHandler>>,
    completions: Option<Arc<dyn CompletionsHandler>>,
    logging: bool,
    default_timeout: Duration,
}

impl ServerBuilder {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            server_info: Implementation::new(name, version),
            instructions: None,
            tools: None,
            resources: None,
            resources_subscribe: false,
            prompts: None,
            completions: None,
            logging: false,
            default_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn tools(mut self, handler: Arc<dyn ToolsHandler>) -> Self {
        self.tools = Some(handler);
        self
    }

    pub fn resources(mut self, handler: Arc<dyn ResourcesHandler>) -> Self {
        self.resources = Some(handler);
        self
    }

    /// Like [`Self::resources`], but also advertises `resources.subscribe`
    /// and routes `resources/subscribe` into the handler instead of
    /// rejecting it with `method_not_found`.
    pub fn resources_with_subscribe(mut self, handler: Arc<dyn ResourcesHandler>) -> Self {
        self.resources = Some(handler);
        self.resources_subscribe = true;
        self
    }

    pub fn prompts(mut self, handler: Arc<dyn PromptsHandler>) -> Self {
        self.prompts = Some(handler);
        self
    }

    pub fn completions(mut self, handler: Arc<dyn CompletionsHandler>) -> Self {
        self.completions = Some(handler);
        self
    }

    /// `logging/setLevel` has no natural handler object to key
    /// auto-detection off (unlike tools/resources/prompts/completions),
    /// so it is an explicit opt-in flag instead.
    pub fn logging(mut self, enabled: bool) -> Self {
        self.logging = enabled;
        self
    }

    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    fn capabilities(&self) -> ServerCapabilities {
        ServerCapabilities {
            tools: self.tools.as_ref().map(|_| ToolsCapabilities {
                list_changed: Some(true),
            }),
            resources: self.resources.as_ref().map(|_| ResourcesCapabilities {
                subscribe: Some(self.resources_subscribe),
                list_changed: Some(true),
            }),
            prompts: self.prompts.as_ref().map(|_| PromptsCapabilities {
                list_changed: Some(true),
            }),
            completions: self.completions.as_ref().map(|_| CompletionsCapabilities::default()),
            logging: self.logging.then(LoggingCapabilities::default),
            experimental: None,
        }
    }

    pub fn build(self, transport: Arc<dyn Transport>) -> Arc<ServerSession> {
        let capabilities = self.capabilities();
        let handlers = Handlers {
            tools: self.tools,
            resources: self.resources,
            resources_subscribe: self.resources_subscribe,
            prompts: self.prompts,
            completions: self.completions,
            logging: self.logging,
        };
        ServerSession::new(
            transport,
            handlers,
            capabilities,
            self.server_info,
            self.instructions,
            self.default_timeout,
        )
    }
}
