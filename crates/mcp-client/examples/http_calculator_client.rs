//! Talks to `mcp-http-server`'s `http_calculator_server` example over
//! Streamable HTTP and calls its `calculator` tool.

use std::sync::Arc;

use clap::Parser;
use mcp_client::{ClientBuilder, HttpClientTransport};

#[derive(Parser)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:8933/mcp")]
    endpoint: url::Url,

    #[arg(long, default_value = "add")]
    op: String,

    #[arg(long, default_value_t = 2.0)]
    a: f64,

    #[arg(long, default_value_t = 3.0)]
    b: f64,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&args.log_level))
        .init();

    let transport = Arc::new(HttpClientTransport::new(args.endpoint));
    let client = ClientBuilder::new("calculator-client", env!("CARGO_PKG_VERSION")).build(transport);

    client.connect().await?;
    let server = client.server_info().await.expect("handshake completed");
    println!("connected to {} {}", server.name, server.version);

    let result = client
        .call_tool("calculator", Some(serde_json::json!({ "op": args.op, "a": args.a, "b": args.b })))
        .await?;
    println!("result: {result}");

    client.close().await?;
    Ok(())
}
