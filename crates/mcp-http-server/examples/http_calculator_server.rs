//! A Streamable HTTP MCP server exposing a `calculator` tool (`add`, `sub`,
//! `mul`, `div`). Pair with `mcp-client`'s `http_calculator_client` example.

use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;
use mcp_http_server::{Dispatcher, ResponseMode};
use mcp_jsonrpc::JsonRpcErrorObject;
use mcp_server::{ServerBuilder, ToolContext, ToolOutcome, ToolsHandler};
use serde_json::Value;

#[derive(Parser)]
struct Args {
    #[arg(long, default_value = "127.0.0.1:8933")]
    bind: std::net::SocketAddr,

    #[arg(long, default_value = "/mcp")]
    path: String,

    #[arg(long, default_value = "info")]
    log_level: String,
}

struct CalculatorTools;

#[async_trait]
impl ToolsHandler for CalculatorTools {
    async fn list_tools(&self, _cursor: Option<String>) -> Result<Value, JsonRpcErrorObject> {
        Ok(serde_json::json!({
            "tools": [{
                "name": "calculator",
                "description": "Evaluates op(a, b) for op in add|sub|mul|div.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "op": { "type": "string", "enum": ["add", "sub", "mul", "div"] },
                        "a": { "type": "number" },
                        "b": { "type": "number" },
                    },
                    "required": ["op", "a", "b"],
                },
            }]
        }))
    }

    async fn call_tool(&self, name: &str, arguments: Option<Value>, _context: ToolContext) -> ToolOutcome {
        if name != "calculator" {
            return ToolOutcome::Immediate(Err(JsonRpcErrorObject::method_not_found(name)));
        }
        ToolOutcome::Immediate(evaluate(arguments))
    }
}

fn evaluate(arguments: Option<Value>) -> Result<Value, JsonRpcErrorObject> {
    let args = arguments.ok_or_else(|| JsonRpcErrorObject::invalid_params("missing arguments"))?;
    let op = args.get("op").and_then(Value::as_str).unwrap_or_default();
    let a = args.get("a").and_then(Value::as_f64).unwrap_or_default();
    let b = args.get("b").and_then(Value::as_f64).unwrap_or_default();

    let value = match op {
        "add" => a + b,
        "sub" => a - b,
        "mul" => a * b,
        "div" if b != 0.0 => a / b,
        "div" => return Err(JsonRpcErrorObject::invalid_params("division by zero")),
        other => return Err(JsonRpcErrorObject::invalid_params(format!("unknown op '{other}'"))),
    };

    Ok(serde_json::json!({
        "content": [{ "type": "text", "text": value.to_string() }],
        "isError": false,
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&args.log_level))
        .init();

    let factory = Arc::new(move |transport: Arc<mcp_http_server::HttpSessionTransport>| {
        ServerBuilder::new("calculator-server", env!("CARGO_PKG_VERSION"))
            .tools(Arc::new(CalculatorTools))
            .build(transport as Arc<dyn mcp_transport::Transport>)
            as Arc<dyn mcp_transport::TransportOwner>
    });

    let dispatcher = Dispatcher::new(args.path, ResponseMode::Sse, factory);
    let bind = args.bind;
    tracing::info!(%bind, "starting calculator server");
    dispatcher.serve(bind).await?;
    Ok(())
}
