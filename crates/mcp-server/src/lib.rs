//! Server-side MCP session engine: handshake, capability auto-detection,
//! method routing and async tool execution (§4.9, §4.10).

pub mod builder;
pub mod error;
pub mod handlers;
pub mod session;
pub mod tool_context;

pub use builder::ServerBuilder;
pub use error::McpServerError;
pub use handlers::{CompletionsHandler, PromptsHandler, ResourcesHandler, ToolOutcome, ToolsHandler};
pub use session::ServerSession;
pub use tool_context::ToolContext;
