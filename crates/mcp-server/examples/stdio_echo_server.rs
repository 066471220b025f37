//! A stdio MCP server exposing one tool, `echo`, which returns its `text`
//! argument verbatim. Run it directly for manual poking, or spawn it from
//! `mcp-client`'s `stdio_echo_client` example.

use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;
use mcp_jsonrpc::JsonRpcErrorObject;
use mcp_server::{ServerBuilder, ToolContext, ToolOutcome, ToolsHandler};
use mcp_transport::StdioTransport;
use serde_json::Value;

#[derive(Parser)]
struct Args {
    /// Log level for the EnvFilter subscriber.
    #[arg(long, default_value = "info")]
    log_level: String,
}

struct EchoTools;

#[async_trait]
impl ToolsHandler for EchoTools {
    async fn list_tools(&self, _cursor: Option<String>) -> Result<Value, JsonRpcErrorObject> {
        Ok(serde_json::json!({
            "tools": [{
                "name": "echo",
                "description": "Returns the `text` argument unchanged.",
                "inputSchema": {
                    "type": "object",
                    "properties": { "text": { "type": "string" } },
                    "required": ["text"],
                },
            }]
        }))
    }

    async fn call_tool(&self, name: &str, arguments: Option<Value>, _context: ToolContext) -> ToolOutcome {
        if name != "echo" {
            return ToolOutcome::Immediate(Err(JsonRpcErrorObject::method_not_found(name)));
        }
        let text = arguments
            .as_ref()
            .and_then(|v| v.get("text"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        ToolOutcome::Immediate(Ok(serde_json::json!({
            "content": [{ "type": "text", "text": text }],
            "isError": false,
        })))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&args.log_level))
        .with_writer(std::io::stderr)
        .init();

    let transport = Arc::new(StdioTransport::in_process());
    let session = ServerBuilder::new("echo-server", env!("CARGO_PKG_VERSION"))
        .instructions("Call the `echo` tool with {\"text\": \"...\"}.")
        .tools(Arc::new(EchoTools))
        .build(transport);

    session.start().await?;

    // Stdio transports run their read loop on a spawned task; block here
    // until the peer closes the pipe.
    std::future::pending::<()>().await;
    Ok(())
}
