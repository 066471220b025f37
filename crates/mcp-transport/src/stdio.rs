//! Stdio transport (§4.3): newline-delimited JSON over a pair of async byte
//! streams, either the host process's own stdin/stdout or a spawned child's.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use crate::transport::{SendOptions, Transport, TransportEvent, TransportOwner};

type BoxedRead = Box<dyn tokio::io::AsyncRead + Send + Unpin>;
type BoxedWrite = Box<dyn AsyncWrite + Send + Unpin>;

enum Source {
    /// This process IS the subprocess; talk over its own stdio.
    InProcess,
    /// A spawned child; kept around so `close` can wait/kill it.
    Spawned(Child),
}

/// A [`Transport`] that frames messages as one-JSON-object-per-line over a
/// readable/writable byte-stream pair.
pub struct StdioTransport {
    reader: Mutex<Option<BoxedRead>>,
    writer: Mutex<BoxedWrite>,
    source: Mutex<Source>,
}

impl StdioTransport {
    /// Use the host process's own stdin/stdout. Use this when the current
    /// binary *is* the MCP server or client being driven by a peer over
    /// pipes.
    pub fn in_process() -> Self {
        Self {
            reader: Mutex::new(Some(Box::new(tokio::io::stdin()))),
            writer: Mutex::new(Box::new(tokio::io::stdout())),
            source: Mutex::new(Source::InProcess),
        }
    }

    /// Spawn `command` with piped stdin/stdout. The child's stderr is
    /// inherited by the host process and is never parsed as protocol
    /// traffic (§4.3).
    pub fn spawn(mut command: Command) -> std::io::Result<Self> {
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        let mut child = command.spawn()?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| std::io::Error::other("child stdin was not piped"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("child stdout was not piped"))?;
        Ok(Self {
            reader: Mutex::new(Some(Box::new(stdout))),
            writer: Mutex::new(Box::new(stdin)),
            source: Mutex::new(Source::Spawned(child)),
        })
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn start(&self, owner: Arc<dyn TransportOwner>) -> std::io::Result<()> {
        let reader = self
            .reader
            .lock()
            .await
            .take()
            .ok_or_else(|| std::io::Error::other("transport already started"))?;

        tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<Value>(&line) {
                            Ok(value) => {
                                owner.on_transport_event(TransportEvent::Message(value)).await;
                            }
                            Err(err) => {
                                tracing::warn!(error = %err, "dropping malformed stdio line");
                            }
                        }
                    }
                    Ok(None) => {
                        owner
                            .on_transport_event(TransportEvent::Closed("eof".to_string()))
                            .await;
                        break;
                    }
                    Err(err) => {
                        owner
                            .on_transport_event(TransportEvent::Closed(err.to_string()))
                            .await;
                        break;
                    }
                }
            }
        });

        Ok(())
    }

    async fn send_with_opts(&self, message: Value, _opts: SendOptions) -> std::io::Result<()> {
        let mut line = serde_json::to_string(&message).map_err(std::io::Error::other)?;
        line.push('\n');
        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await
    }

    async fn close(&self) -> std::io::Result<()> {
        let mut source = self.source.lock().await;
        if let Source::Spawned(child) = &mut *source {
            // Best-effort: the child may already have exited.
            let _ = child.start_kill();
            let _ = child.wait().await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use tokio::io::duplex;

    struct RecordingOwner {
        events: StdMutex<Vec<TransportEvent>>,
    }

    #[async_trait]
    impl TransportOwner for RecordingOwner {
        async fn on_transport_event(&self, event: TransportEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[tokio::test]
    async fn frames_one_json_object_per_line() {
        let (mut client, server) = duplex(4096);
        let transport = StdioTransport {
            reader: Mutex::new(Some(Box::new(server))),
            writer: Mutex::new(Box::new(tokio::io::sink())),
            source: Mutex::new(Source::InProcess),
        };
        let owner = Arc::new(RecordingOwner {
            events: StdMutex::new(Vec::new()),
        });
        transport.start(owner.clone()).await.unwrap();

        client
            .write_all(b"{\"jsonrpc\":\"2.0\",\"method\":\"ping\"}\n")
            .await
            .unwrap();
        drop(client);

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let events = owner.events.lock().unwrap();
        assert!(matches!(events[0], TransportEvent::Message(_)));
        assert!(matches!(events[1], TransportEvent::Closed(_)));
    }

    #[tokio::test]
    async fn send_appends_newline() {
        let (client, server) = duplex(4096);
        let transport = StdioTransport {
            reader: Mutex::new(Some(Box::new(tokio::io::empty()))),
            writer: Mutex::new(Box::new(server)),
            source: Mutex::new(Source::InProcess),
        };
        transport
            .send(serde_json::json!({"jsonrpc": "2.0", "method": "ping"}))
            .await
            .unwrap();
        drop(transport);

        let mut reader = BufReader::new(client);
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        assert_eq!(line, "{\"jsonrpc\":\"2.0\",\"method\":\"ping\"}\n");
    }
}
