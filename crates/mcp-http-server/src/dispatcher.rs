//! The request router (§4.7): one hyper service that owns the session
//! registry, decides JSON vs SSE response mode, and enforces the local-origin
//! admission rule.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, StreamBody, combinators::BoxBody};
use hyper::body::{Frame, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use mcp_jsonrpc::{Message, RequestId, classify};
use mcp_transport::{Transport, TransportOwner};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::{RwLock, mpsc};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

use crate::error::HttpMcpError;
use crate::protocol::{accepts_event_stream, extract_session_id, is_local_origin};
use crate::session_transport::{HttpSessionTransport, StreamChunk};
use crate::sse_encode::{done_frame, error_frame, event_frame};

type ResponseBody = BoxBody<Bytes, std::io::Error>;

/// How a successful POST response should be framed. SSE is the spec default
/// (§4.7); JSON mode exists for clients that only implement the legacy
/// request/response shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    Json,
    Sse,
}

/// Builds a new session engine bound to a freshly created
/// [`HttpSessionTransport`]. Supplied by the crate embedding this dispatcher
/// (typically `mcp-server`'s server session engine constructor).
pub type SessionFactory = Arc<
    dyn Fn(Arc<HttpSessionTransport>) -> Arc<dyn TransportOwner> + Send + Sync,
>;

struct SessionEntry {
    transport: Arc<HttpSessionTransport>,
}

pub struct Dispatcher {
    mcp_path: String,
    response_mode: ResponseMode,
    sessions: RwLock<HashMap<String, SessionEntry>>,
    session_factory: SessionFactory,
}

impl Dispatcher {
    pub fn new(mcp_path: impl Into<String>, response_mode: ResponseMode, session_factory: SessionFactory) -> Arc<Self> {
        Arc::new(Self {
            mcp_path: mcp_path.into(),
            response_mode,
            sessions: RwLock::new(HashMap::new()),
            session_factory,
        })
    }

    pub async fn serve(self: Arc<Self>, bind: SocketAddr) -> std::io::Result<()> {
        let listener = TcpListener::bind(bind).await?;
        tracing::info!(%bind, path = %self.mcp_path, "mcp http dispatcher listening");
        loop {
            let (stream, peer) = listener.accept().await?;
            let dispatcher = self.clone();
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let dispatcher = dispatcher.clone();
                    async move { dispatcher.handle(req).await }
                });
                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    tracing::debug!(%peer, error = %err, "connection ended");
                }
            });
        }
    }

    async fn handle(
        &self,
        req: Request<Incoming>,
    ) -> Result<Response<ResponseBody>, std::convert::Infallible> {
        Ok(self.route(req).await.unwrap_or_else(error_response))
    }

    async fn route(&self, req: Request<Incoming>) -> Result<Response<ResponseBody>, HttpMcpError> {
        if req.uri().path() != self.mcp_path {
            return Ok(status_only(StatusCode::NOT_FOUND));
        }
        if !is_local_origin(req.headers()) {
            return Err(HttpMcpError::ForbiddenOrigin(
                "Origin/Host did not resolve to a loopback address".to_string(),
            ));
        }

        match *req.method() {
            Method::POST => self.handle_post(req).await,
            Method::GET => self.handle_get(req).await,
            Method::DELETE => self.handle_delete(req).await,
            _ => Ok(status_only(StatusCode::METHOD_NOT_ALLOWED)),
        }
    }

    async fn handle_post(&self, req: Request<Incoming>) -> Result<Response<ResponseBody>, HttpMcpError> {
        let headers = req.headers().clone();
        let body = req.into_body().collect().await?.to_bytes();
        let value: Value = serde_json::from_slice(&body)?;

        let is_initialize = value.get("method").and_then(Value::as_str) == Some("initialize");

        let (session_id, transport) = if is_initialize {
            let id = uuid::Uuid::now_v7().to_string();
            let transport = Arc::new(HttpSessionTransport::new());
            let owner = (self.session_factory)(transport.clone());
            transport.start(owner).await.map_err(HttpMcpError::Io)?;
            self.sessions
                .write()
                .await
                .insert(id.clone(), SessionEntry { transport: transport.clone() });
            (Some(id), transport)
        } else {
            let id = extract_session_id(&headers).ok_or(HttpMcpError::MissingSessionId)?;
            let transport = self
                .sessions
                .read()
                .await
                .get(&id)
                .map(|entry| entry.transport.clone())
                .ok_or(HttpMcpError::UnknownSession)?;
            (None, transport)
        };

        let use_sse = self.response_mode == ResponseMode::Sse && accepts_event_stream(&headers);
        let classified = classify(value.clone())?;
        let related_id = classified.related_id().cloned();

        let mut response = if use_sse {
            self.respond_streaming(&transport, value, related_id).await?
        } else {
            self.respond_json(&transport, value).await?
        };

        if let Some(id) = session_id {
            response.headers_mut().insert(
                crate::protocol::SESSION_HEADER,
                http::HeaderValue::from_str(&id).expect("uuid is a valid header value"),
            );
        }
        Ok(response)
    }

    async fn respond_json(
        &self,
        transport: &HttpSessionTransport,
        value: Value,
    ) -> Result<Response<ResponseBody>, HttpMcpError> {
        match transport.deliver(value).await? {
            crate::session_transport::DeliverOutcome::Response(body) => {
                Ok(json_response(StatusCode::OK, &body)?)
            }
            crate::session_transport::DeliverOutcome::Accepted => Ok(status_only(StatusCode::ACCEPTED)),
        }
    }

    async fn respond_streaming(
        &self,
        transport: &HttpSessionTransport,
        value: Value,
        related_id: Option<RequestId>,
    ) -> Result<Response<ResponseBody>, HttpMcpError> {
        let Some(id) = related_id else {
            // Notifications/Responses have nothing to stream back.
            return self.respond_json(transport, value).await;
        };

        let (tx, rx) = mpsc::unbounded_channel::<StreamChunk>();
        transport.register_stream(id, tx).await;
        transport.deliver_async(value).await?;

        let stream = UnboundedReceiverStream::new(rx).map(|chunk| {
            let frame = match chunk {
                StreamChunk::Event(v) => event_frame(&v),
                StreamChunk::Done(v) => done_frame(&v),
                StreamChunk::Error(reason) => error_frame(&reason),
            };
            Ok::<_, std::io::Error>(Frame::data(Bytes::from(frame)))
        });

        let body = BoxBody::new(StreamBody::new(stream));
        Ok(Response::builder()
            .status(StatusCode::OK)
            .header(http::header::CONTENT_TYPE, "text/event-stream")
            .header(http::header::CACHE_CONTROL, "no-cache")
            .body(body)
            .expect("well-formed response"))
    }

    async fn handle_get(&self, req: Request<Incoming>) -> Result<Response<ResponseBody>, HttpMcpError> {
        if !accepts_event_stream(req.headers()) {
            return Ok(status_only(StatusCode::NOT_ACCEPTABLE));
        }
        let id = extract_session_id(req.headers()).ok_or(HttpMcpError::MissingSessionId)?;
        if !self.sessions.read().await.contains_key(&id) {
            return Err(HttpMcpError::UnknownSession);
        }
        // An idle listen stream for server-initiated traffic with no bound
        // client request; correctness of tool flows never depends on this.
        let (_tx, rx) = mpsc::unbounded_channel::<StreamChunk>();
        let stream = UnboundedReceiverStream::new(rx)
            .map(|_: StreamChunk| Ok::<_, std::io::Error>(Frame::data(Bytes::new())));
        let body = BoxBody::new(StreamBody::new(stream));
        Ok(Response::builder()
            .status(StatusCode::OK)
            .header(http::header::CONTENT_TYPE, "text/event-stream")
            .body(body)
            .expect("well-formed response"))
    }

    async fn handle_delete(&self, req: Request<Incoming>) -> Result<Response<ResponseBody>, HttpMcpError> {
        let id = extract_session_id(req.headers()).ok_or(HttpMcpError::MissingSessionId)?;
        let entry = self.sessions.write().await.remove(&id);
        match entry {
            Some(entry) => {
                entry.transport.close().await.map_err(HttpMcpError::Io)?;
                Ok(status_only(StatusCode::NO_CONTENT))
            }
            None => Err(HttpMcpError::UnknownSession),
        }
    }
}

fn status_only(status: StatusCode) -> Response<ResponseBody> {
    Response::builder()
        .status(status)
        .body(BoxBody::new(Full::new(Bytes::new()).map_err(|never: std::convert::Infallible| match never {})))
        .expect("well-formed response")
}

fn json_response(status: StatusCode, value: &Value) -> Result<Response<ResponseBody>, HttpMcpError> {
    let bytes = Bytes::from(serde_json::to_vec(value)?);
    Ok(Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(BoxBody::new(Full::new(bytes).map_err(|never: std::convert::Infallible| match never {})))
        .expect("well-formed response"))
}

fn error_response(err: HttpMcpError) -> Response<ResponseBody> {
    let status = match err {
        HttpMcpError::ForbiddenOrigin(_) => StatusCode::FORBIDDEN,
        HttpMcpError::UnknownSession => StatusCode::NOT_FOUND,
        HttpMcpError::MissingSessionId
        | HttpMcpError::JsonRpc(_)
        | HttpMcpError::InvalidRequest(_)
        | HttpMcpError::Serialization(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::warn!(error = %err, "dispatcher rejected request");
    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "id": null,
        "error": { "code": -32600, "message": err.to_string() }
    });
    json_response(status, &body).unwrap_or_else(|_| status_only(StatusCode::INTERNAL_SERVER_ERROR))
}
