use super::transport::{Transport, TransportFactory};
use crate::types::{Envelope, RealtimeError, Result};
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket factory for creating WebSocket connections
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketFactory;

#[async_trait]
impl TransportFactory for WebSocketFactory {
    async fn dial(&self, url: &str) -> Result<Arc<dyn Transport>> {
        tracing::debug!("Creating WebSocket connection to: {}", without_query(url));

        let (ws_stream, response) = connect_async(url)
            .await
            .map_err(|e| RealtimeError::Connect(e.to_string()))?;

        tracing::debug!(
            "WebSocket handshake completed with status {}",
            response.status()
        );
        Ok(Arc::new(WebSocketTransport::new(ws_stream)))
    }
}

/// Strips the query string so the api key never reaches the logs.
fn without_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

/// Transport over a tokio-tungstenite stream, split so that a write can
/// proceed while the read task is parked on the socket.
pub struct WebSocketTransport {
    writer: Mutex<Option<SplitSink<WsStream, Message>>>,
    reader: Mutex<SplitStream<WsStream>>,
    closed: CancellationToken,
}

impl WebSocketTransport {
    pub fn new(ws_stream: WsStream) -> Self {
        let (write_half, read_half) = ws_stream.split();
        Self {
            writer: Mutex::new(Some(write_half)),
            reader: Mutex::new(read_half),
            closed: CancellationToken::new(),
        }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn write(&self, envelope: &Envelope) -> Result<()> {
        if self.closed.is_cancelled() {
            return Err(RealtimeError::TransportClosed);
        }

        let json = envelope.encode()?;
        let mut ws_guard = tokio::select! {
            biased;
            _ = self.closed.cancelled() => return Err(RealtimeError::TransportClosed),
            guard = self.writer.lock() => guard,
        };
        let Some(ws) = ws_guard.as_mut() else {
            return Err(RealtimeError::TransportClosed);
        };

        // close() cancels first, then waits for the sink
        tokio::select! {
            biased;
            _ = self.closed.cancelled() => Err(RealtimeError::TransportClosed),
            sent = ws.send(Message::Text(json.into())) => Ok(sent?),
        }
    }

    async fn read(&self) -> Result<Envelope> {
        let mut reader = tokio::select! {
            biased;
            _ = self.closed.cancelled() => return Err(RealtimeError::TransportClosed),
            guard = self.reader.lock() => guard,
        };

        loop {
            let next = tokio::select! {
                biased;
                _ = self.closed.cancelled() => return Err(RealtimeError::TransportClosed),
                next = reader.next() => next,
            };

            match next {
                Some(Ok(Message::Text(text))) => {
                    tracing::debug!("Received text message: {}", text.as_str());
                    return Envelope::decode(text.as_str());
                }
                Some(Ok(Message::Close(frame))) => {
                    if let Some(close_frame) = frame {
                        tracing::warn!(
                            "Server closed connection: code={:?}, reason='{}'",
                            close_frame.code,
                            close_frame.reason.as_str()
                        );
                    } else {
                        tracing::warn!("Server closed connection without close frame");
                    }
                    self.closed.cancel();
                    return Err(RealtimeError::TransportClosed);
                }
                Some(Ok(Message::Ping(data))) => {
                    tracing::debug!("Received ping ({} bytes)", data.len());
                }
                Some(Ok(Message::Pong(data))) => {
                    tracing::debug!("Received pong ({} bytes)", data.len());
                }
                Some(Ok(Message::Binary(data))) => {
                    tracing::warn!(
                        "Received unexpected binary message ({} bytes)",
                        data.len()
                    );
                }
                Some(Ok(Message::Frame(_))) => {
                    tracing::debug!("Received raw frame (internal)");
                }
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) | None => {
                    self.closed.cancel();
                    return Err(RealtimeError::TransportClosed);
                }
                Some(Err(e)) => {
                    self.closed.cancel();
                    return Err(e.into());
                }
            }
        }
    }

    async fn close(&self) -> Result<()> {
        self.closed.cancel();

        let writer = self.writer.lock().await.take();
        if let Some(mut ws) = writer
            && let Err(e) = ws.close().await
        {
            tracing::debug!("Error while closing WebSocket: {}", e);
        }
        Ok(())
    }
}
