// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction over the two supported wire mechanisms.
//!
//! Provides a trait-based transport layer that enables:
//! - Bidirectional WebSocket connections
//! - Receive-only server-sent event streams over HTTP
//! - Mock transports for unit testing
//!
//! Transports move text frames only. Encoding outbound values and
//! classifying inbound text belongs to the connection manager.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use fieldsync_core::SseDecoder;
use futures_util::stream::BoxStream;

/// Error type for transport operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed unexpectedly.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Which wire mechanism a transport uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Bidirectional socket. Supports send and heartbeat.
    Socket,
    /// Receive-only event stream.
    Stream,
}

/// Produces a fresh transport for every connection attempt.
pub type TransportFactory = Arc<dyn Fn() -> Box<dyn Transport> + Send + Sync>;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A single physical connection carrying text frames.
pub trait Transport: Send {
    /// Which mechanism this transport uses.
    fn kind(&self) -> TransportKind;

    /// Open the connection.
    fn connect(&mut self, url: &str) -> BoxFuture<'_, TransportResult<()>>;

    /// Close the connection. Closing an unopened transport is not an error.
    fn disconnect(&mut self) -> BoxFuture<'_, TransportResult<()>>;

    /// Send one text frame.
    fn send(&mut self, text: String) -> BoxFuture<'_, TransportResult<()>>;

    /// Receive the next text frame.
    ///
    /// Returns `None` once the remote side has closed the connection.
    fn recv(&mut self) -> BoxFuture<'_, TransportResult<Option<String>>>;

    /// Check if connected.
    fn is_connected(&self) -> bool;
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// WebSocket transport implementation using tokio-tungstenite.
pub struct WebSocketTransport {
    /// The WebSocket connection, if connected.
    ws: Option<WebSocketConnection>,
}

struct WebSocketConnection {
    sink: futures_util::stream::SplitSink<WsStream, tokio_tungstenite::tungstenite::Message>,
    stream: futures_util::stream::SplitStream<WsStream>,
}

impl WebSocketTransport {
    pub fn new() -> Self {
        WebSocketTransport { ws: None }
    }

    /// Factory producing WebSocket transports.
    pub fn factory() -> TransportFactory {
        Arc::new(|| Box::new(WebSocketTransport::new()))
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for WebSocketTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Socket
    }

    fn connect(&mut self, url: &str) -> BoxFuture<'_, TransportResult<()>> {
        let url = url.to_string();
        Box::pin(async move {
            use futures_util::StreamExt;

            let (ws_stream, _) = tokio_tungstenite::connect_async(&url)
                .await
                .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

            let (sink, stream) = ws_stream.split();
            self.ws = Some(WebSocketConnection { sink, stream });
            Ok(())
        })
    }

    fn disconnect(&mut self) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            if let Some(mut ws) = self.ws.take() {
                use futures_util::SinkExt;
                if let Err(e) = ws.sink.close().await {
                    tracing::debug!(error = %e, "websocket close handshake failed");
                }
            }
            Ok(())
        })
    }

    fn send(&mut self, text: String) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            use futures_util::SinkExt;
            use tokio_tungstenite::tungstenite::Message;

            let ws = self.ws.as_mut().ok_or(TransportError::ConnectionClosed)?;

            if let Err(e) = ws.sink.send(Message::Text(text.into())).await {
                self.ws = None;
                return Err(TransportError::SendFailed(e.to_string()));
            }
            Ok(())
        })
    }

    fn recv(&mut self) -> BoxFuture<'_, TransportResult<Option<String>>> {
        Box::pin(async move {
            use futures_util::StreamExt;
            use tokio_tungstenite::tungstenite::Message;

            let ws = self.ws.as_mut().ok_or(TransportError::ConnectionClosed)?;

            loop {
                match ws.stream.next().await {
                    Some(Ok(Message::Text(text))) => return Ok(Some(text.as_str().to_owned())),
                    Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => return Ok(Some(text)),
                        Err(_) => {
                            tracing::debug!(len = bytes.len(), "dropping non-utf8 binary frame");
                            continue;
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        self.ws = None;
                        return Ok(None);
                    }
                    // Ping, pong and raw frames are handled by tungstenite.
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        self.ws = None;
                        return Err(TransportError::ReceiveFailed(e.to_string()));
                    }
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.ws.is_some()
    }
}

/// Server-sent event transport over a streaming HTTP GET.
///
/// Each dispatched event's data becomes one text frame. The stream is
/// receive-only; [`Transport::send`] always fails.
pub struct EventStreamTransport {
    client: reqwest::Client,
    body: Option<BoxStream<'static, reqwest::Result<Vec<u8>>>>,
    decoder: SseDecoder,
    ready: VecDeque<String>,
}

impl EventStreamTransport {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        EventStreamTransport {
            client,
            body: None,
            decoder: SseDecoder::new(),
            ready: VecDeque::new(),
        }
    }

    /// Factory producing event-stream transports that share one HTTP client.
    pub fn factory() -> TransportFactory {
        let client = reqwest::Client::new();
        Arc::new(move || Box::new(EventStreamTransport::with_client(client.clone())))
    }
}

impl Default for EventStreamTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for EventStreamTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Stream
    }

    fn connect(&mut self, url: &str) -> BoxFuture<'_, TransportResult<()>> {
        let url = url.to_string();
        Box::pin(async move {
            use futures_util::StreamExt;

            let response = self
                .client
                .get(&url)
                .header(reqwest::header::ACCEPT, "text/event-stream")
                .send()
                .await
                .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(TransportError::ConnectionFailed(format!(
                    "unexpected status {status}"
                )));
            }

            self.decoder = SseDecoder::new();
            self.ready.clear();
            self.body = Some(
                response
                    .bytes_stream()
                    .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
                    .boxed(),
            );
            Ok(())
        })
    }

    fn disconnect(&mut self) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            self.body = None;
            self.ready.clear();
            Ok(())
        })
    }

    fn send(&mut self, _text: String) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            Err(TransportError::SendFailed(
                "event streams are receive-only".to_string(),
            ))
        })
    }

    fn recv(&mut self) -> BoxFuture<'_, TransportResult<Option<String>>> {
        Box::pin(async move {
            use futures_util::StreamExt;

            loop {
                if let Some(data) = self.ready.pop_front() {
                    return Ok(Some(data));
                }

                let body = self.body.as_mut().ok_or(TransportError::ConnectionClosed)?;
                match body.next().await {
                    Some(Ok(chunk)) => {
                        let events = self.decoder.push(&chunk);
                        self.ready.extend(events);
                    }
                    Some(Err(e)) => {
                        self.body = None;
                        return Err(TransportError::ReceiveFailed(e.to_string()));
                    }
                    None => {
                        self.body = None;
                        return Ok(None);
                    }
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.body.is_some()
    }
}
