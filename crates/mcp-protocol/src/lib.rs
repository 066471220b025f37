//! MCP `2025-11-25` data model: the handshake envelope, capability
//! declarations, logging levels, and canonical method names.
//!
//! The core routes method bodies without interpreting them (§1 of the
//! specification this crate implements), so most request/response payloads
//! for tools, resources, prompts, sampling, elicitation, and completion stay
//! opaque `serde_json::Value` at this layer. Only the handshake, capability
//! tables, logging severities, and `_meta.progressToken` get typed
//! representations because the session engines in `mcp-server`/`mcp-client`
//! materially depend on them for routing.

pub mod capabilities;
pub mod error;
pub mod initialize;
pub mod logging;
pub mod meta;
pub mod methods;

pub use capabilities::{
    ClientCapabilities, CompletionsCapabilities, ElicitationCapabilities, LoggingCapabilities,
    PromptsCapabilities, ResourcesCapabilities, RootsCapabilities, SamplingCapabilities,
    ServerCapabilities, ToolsCapabilities,
};
pub use error::McpError;
pub use initialize::{Implementation, InitializeParams, InitializeResult};
pub use logging::LoggingLevel;
pub use meta::Meta;

/// The single protocol version this runtime speaks.
pub const PROTOCOL_VERSION: &str = "2025-11-25";
