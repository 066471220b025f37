//! Spawns `mcp-server`'s `stdio_echo_server` example as a child process,
//! completes the handshake, lists its tools, and calls `echo`.

use std::sync::Arc;

use clap::Parser;
use mcp_client::ClientBuilder;
use mcp_transport::StdioTransport;
use tokio::process::Command;

#[derive(Parser)]
struct Args {
    /// Path to the server binary (defaults to the sibling `cargo` build).
    #[arg(long, default_value = "stdio_echo_server")]
    server_bin: String,

    #[arg(long, default_value = "hello from the client")]
    text: String,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&args.log_level))
        .init();

    let command = Command::new(&args.server_bin);
    let transport = Arc::new(StdioTransport::spawn(command)?);
    let client = ClientBuilder::new("echo-client", env!("CARGO_PKG_VERSION")).build(transport);

    client.connect().await?;
    let server = client.server_info().await.expect("handshake completed");
    println!("connected to {} {}", server.name, server.version);

    let tools = client.list_tools(None).await?;
    println!("tools: {tools}");

    let result = client
        .call_tool("echo", Some(serde_json::json!({ "text": args.text })))
        .await?;
    println!("echo result: {result}");

    client.close().await?;
    Ok(())
}
