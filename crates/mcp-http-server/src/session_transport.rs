//! The server-side transport instantiated by the dispatcher for one session
//! (§4.6). Inbound traffic arrives synchronously through [`deliver`] /
//! [`deliver_async`] from whichever HTTP connection is currently handling a
//! POST for this session; outbound traffic arrives through the
//! [`mcp_transport::Transport`] half from the session engine and is routed
//! to a synchronous waiter or a registered SSE stream by request id.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mcp_jsonrpc::{Message, RequestId, classify};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock, mpsc, oneshot};

use mcp_transport::{SendOptions, Transport, TransportEvent, TransportOwner};

/// A chunk destined for an open SSE response body.
#[derive(Debug, Clone)]
pub enum StreamChunk {
    Event(Value),
    Done(Value),
    Error(String),
}

enum Disposition {
    Sync(oneshot::Sender<Value>),
    Stream(mpsc::UnboundedSender<StreamChunk>),
}

/// What happened to a message handed to [`HttpSessionTransport::deliver`].
pub enum DeliverOutcome {
    /// The session produced a final response (JSON-mode POST path).
    Response(Value),
    /// A Notification or Response was forwarded; there is nothing to wait
    /// for (§6's 202 Accepted path).
    Accepted,
}

#[derive(Default)]
pub struct HttpSessionTransport {
    pending: Mutex<HashMap<RequestId, Disposition>>,
    owner: RwLock<Option<Arc<dyn TransportOwner>>>,
}

impl HttpSessionTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-register the SSE stream that will carry the eventual response (and
    /// any intermediate server-to-client traffic) for `id`. Called by the
    /// dispatcher before handing the inbound message to [`Self::deliver_async`]
    /// so there is no window where a fast response would have nowhere to go.
    pub async fn register_stream(&self, id: RequestId, sender: mpsc::UnboundedSender<StreamChunk>) {
        self.pending.lock().await.insert(id, Disposition::Stream(sender));
    }

    /// Deliver one decoded JSON-RPC object and, for Requests, block until the
    /// session emits the matching Response. Used for the JSON response mode.
    pub async fn deliver(&self, message: Value) -> Result<DeliverOutcome, crate::HttpMcpError> {
        let classified = classify(message.clone())?;
        match classified {
            Message::Request(req) => {
                let (tx, rx) = oneshot::channel();
                self.pending.lock().await.insert(req.id.clone(), Disposition::Sync(tx));
                self.notify_owner(message).await;
                let response = rx.await.map_err(|_| crate::HttpMcpError::SessionClosed)?;
                Ok(DeliverOutcome::Response(response))
            }
            Message::Notification(_) | Message::Response(_) => {
                self.notify_owner(message).await;
                Ok(DeliverOutcome::Accepted)
            }
        }
    }

    /// Deliver one decoded JSON-RPC object without waiting for a reply. Used
    /// for the SSE response mode, where the reply (and any intermediate
    /// traffic) arrives through the stream registered via
    /// [`Self::register_stream`].
    pub async fn deliver_async(&self, message: Value) -> Result<(), crate::HttpMcpError> {
        classify(message.clone())?;
        self.notify_owner(message).await;
        Ok(())
    }

    async fn notify_owner(&self, message: Value) {
        if let Some(owner) = self.owner.read().await.as_ref() {
            owner.on_transport_event(TransportEvent::Message(message)).await;
        } else {
            tracing::warn!("http session transport has no owner yet; dropping inbound message");
        }
    }

    async fn route_by_related(&self, related: Option<RequestId>, message: Value) {
        let Some(id) = related else {
            tracing::debug!("dropping server-initiated traffic with no related request id");
            return;
        };
        let pending = self.pending.lock().await;
        match pending.get(&id) {
            Some(Disposition::Stream(tx)) => {
                let _ = tx.send(StreamChunk::Event(message));
            }
            _ => {
                tracing::debug!(?id, "dropping: no open stream bound to this request id");
            }
        }
    }
}

#[async_trait]
impl Transport for HttpSessionTransport {
    async fn start(&self, owner: Arc<dyn TransportOwner>) -> std::io::Result<()> {
        *self.owner.write().await = Some(owner);
        Ok(())
    }

    async fn send_with_opts(&self, message: Value, opts: SendOptions) -> std::io::Result<()> {
        let classified = classify(message.clone()).map_err(std::io::Error::other)?;
        match classified {
            Message::Response(resp) => {
                let disposition = self.pending.lock().await.remove(&resp.id);
                match disposition {
                    Some(Disposition::Sync(tx)) => {
                        let _ = tx.send(message);
                    }
                    Some(Disposition::Stream(tx)) => {
                        let _ = tx.send(StreamChunk::Done(message));
                    }
                    None => {
                        tracing::debug!(id = ?resp.id, "response for unknown or expired pending entry");
                    }
                }
            }
            Message::Notification(_) | Message::Request(_) => {
                self.route_by_related(opts.related_request_id, message).await;
            }
        }
        Ok(())
    }

    async fn close(&self) -> std::io::Result<()> {
        let mut pending = self.pending.lock().await;
        for (_, disposition) in pending.drain() {
            if let Disposition::Stream(tx) = disposition {
                let _ = tx.send(StreamChunk::Error("session closed".to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct NullOwner;
    #[async_trait]
    impl TransportOwner for NullOwner {
        async fn on_transport_event(&self, _event: TransportEvent) {}
    }

    #[tokio::test]
    async fn sync_deliver_blocks_until_send() {
        let transport = Arc::new(HttpSessionTransport::new());
        transport.start(Arc::new(NullOwner)).await.unwrap();

        let transport_clone = transport.clone();
        let handle = tokio::spawn(async move {
            transport_clone
                .deliver(json!({"jsonrpc":"2.0","id":1,"method":"ping"}))
                .await
                .unwrap()
        });

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        transport
            .send(json!({"jsonrpc":"2.0","id":1,"result":{}}))
            .await
            .unwrap();

        match handle.await.unwrap() {
            DeliverOutcome::Response(value) => {
                assert_eq!(value["result"], json!({}));
            }
            DeliverOutcome::Accepted => panic!("expected a response"),
        }
    }

    #[tokio::test]
    async fn stream_disposition_receives_events_then_done() {
        let transport = HttpSessionTransport::new();
        transport.start(Arc::new(NullOwner)).await.unwrap();
        let id = RequestId::Number(7);
        let (tx, mut rx) = mpsc::unbounded_channel();
        transport.register_stream(id.clone(), tx).await;

        transport
            .send_with_opts(
                json!({"jsonrpc":"2.0","method":"notifications/progress"}),
                SendOptions::related_to(id.clone()),
            )
            .await
            .unwrap();
        transport
            .send(json!({"jsonrpc":"2.0","id":7,"result":{"ok":true}}))
            .await
            .unwrap();

        assert!(matches!(rx.recv().await, Some(StreamChunk::Event(_))));
        assert!(matches!(rx.recv().await, Some(StreamChunk::Done(_))));
    }

    #[tokio::test]
    async fn notification_without_related_id_is_dropped() {
        let transport = HttpSessionTransport::new();
        transport.start(Arc::new(NullOwner)).await.unwrap();
        // No pending entry, no related id: should not panic or block.
        transport
            .send(json!({"jsonrpc":"2.0","method":"notifications/message"}))
            .await
            .unwrap();
    }
}
