//! Client-side MCP session engine (§4.8) and transports (§4.5).

pub mod builder;
pub mod error;
pub mod handlers;
pub mod http_transport;
pub mod session;

pub use builder::ClientBuilder;
pub use error::McpClientError;
pub use handlers::{NotificationSink, ServerRequestHandler};
pub use http_transport::HttpClientTransport;
pub use session::ClientSession;
