//! The transport contract (§4.2).

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use mcp_jsonrpc::RequestId;

/// Tag carried by `send`'s `opts` variant so a dispatcher can route a
/// server-emitted message to the stream bound to the client request it
/// belongs to (§4.6's `related_request_id`). Transports that have no notion
/// of streams (stdio) ignore this entirely.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    pub related_request_id: Option<RequestId>,
}

impl SendOptions {
    pub fn related_to(id: RequestId) -> Self {
        Self {
            related_request_id: Some(id),
        }
    }
}

/// The two events a transport raises on its owner, per §4.2.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A decoded JSON object arrived from the peer.
    Message(Value),
    /// The transport will deliver no further events. `reason` is a short,
    /// human-readable description (`"eof"`, `"child process exited"`, an IO
    /// error's `Display`, …).
    Closed(String),
}

/// The owner a [`Transport`] reports events to. Session engines implement
/// this; it is the only channel through which a transport talks back up.
#[async_trait]
pub trait TransportOwner: Send + Sync {
    async fn on_transport_event(&self, event: TransportEvent);
}

/// An owned, process-like byte-message carrier.
///
/// Implementors MUST preserve the order of outgoing `send`/`send_with_opts`
/// calls as observed by the peer, and MUST emit [`TransportEvent::Closed`]
/// exactly once over the lifetime of a `start`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Begin delivering events to `owner`. Implementations typically spawn
    /// a background read loop here.
    async fn start(&self, owner: Arc<dyn TransportOwner>) -> std::io::Result<()>;

    /// Send one message to the peer, preserving call order.
    async fn send(&self, message: Value) -> std::io::Result<()> {
        self.send_with_opts(message, SendOptions::default()).await
    }

    /// Send one message, tagged with routing hints a dispatcher may use.
    /// Transports that do not route by request id may ignore `opts` and
    /// defer to [`Transport::send`]'s framing.
    async fn send_with_opts(&self, message: Value, opts: SendOptions) -> std::io::Result<()>;

    /// Tear the transport down. Idempotent: closing an already-closed
    /// transport is a no-op.
    async fn close(&self) -> std::io::Result<()>;
}
