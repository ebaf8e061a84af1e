//! aisstream.io websocket client
//!
//! Handles connection, the subscribe handshake, and frame receiving. aisstream.io
//! sends no subscription acknowledgment; data frames simply start flowing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::aisstream::messages::SubscribeRequest;

#[derive(Error, Debug)]
pub enum AisStreamWebSocketError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Read timeout after {0:?}")]
    ReadTimeout(Duration),

    #[error("Connection closed")]
    ConnectionClosed,
}

/// aisstream.io websocket client
pub struct AisStreamWebSocket {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    read_timeout: Duration,
    /// Epoch second of the last inbound message of any kind, control frames included
    activity: Option<Arc<AtomicU64>>,
}

impl AisStreamWebSocket {
    /// Connect to the feed endpoint
    pub async fn connect(url: &str, read_timeout: Duration) -> Result<Self, AisStreamWebSocketError> {
        let url = Url::parse(url).map_err(|e| AisStreamWebSocketError::Connection(e.to_string()))?;
        info!(url = %url, "Connecting to aisstream.io WebSocket");

        let (ws, response) = connect_async(url.as_str()).await?;

        info!(status = ?response.status(), "aisstream.io WebSocket connected");

        Ok(Self {
            ws,
            read_timeout,
            activity: None,
        })
    }

    /// Record inbound activity into `handle`
    pub fn with_activity(mut self, handle: Arc<AtomicU64>) -> Self {
        self.activity = Some(handle);
        self
    }

    fn touch(&self) {
        if let Some(activity) = &self.activity {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0);
            activity.store(now, Ordering::SeqCst);
        }
    }

    /// Send the subscription request. Must be the first outbound frame.
    pub async fn subscribe(
        &mut self,
        request: &SubscribeRequest,
    ) -> Result<(), AisStreamWebSocketError> {
        let msg = serde_json::to_string(request)?;
        debug!(
            bounding_boxes = request.bounding_boxes.len(),
            filter_mmsi = request.filter_mmsi.len(),
            filter_message_types = ?request.filter_message_types,
            "Sending aisstream.io subscribe request"
        );

        self.ws.send(Message::Text(msg)).await?;
        Ok(())
    }

    /// Receive the next data frame as raw bytes.
    ///
    /// Pings are answered and skipped. Fails on close, transport error, or when
    /// nothing arrives within the read timeout.
    pub async fn recv_frame(&mut self) -> Result<Vec<u8>, AisStreamWebSocketError> {
        loop {
            let recv_result = tokio::time::timeout(self.read_timeout, self.ws.next()).await;
            if let Ok(Some(Ok(_))) = &recv_result {
                self.touch();
            }

            match recv_result {
                Err(_) => {
                    warn!(
                        timeout_secs = self.read_timeout.as_secs(),
                        "aisstream.io WebSocket read timeout"
                    );
                    return Err(AisStreamWebSocketError::ReadTimeout(self.read_timeout));
                }
                Ok(Some(Ok(Message::Text(text)))) => return Ok(text.into_bytes()),
                Ok(Some(Ok(Message::Binary(data)))) => return Ok(data),
                Ok(Some(Ok(Message::Ping(data)))) => {
                    trace!("Received WS ping, sending pong");
                    self.ws.send(Message::Pong(data)).await?;
                }
                Ok(Some(Ok(Message::Close(frame)))) => {
                    info!(frame = ?frame, "aisstream.io WebSocket closed");
                    return Err(AisStreamWebSocketError::ConnectionClosed);
                }
                Ok(Some(Ok(_))) => continue,
                Ok(Some(Err(e))) => return Err(e.into()),
                Ok(None) => return Err(AisStreamWebSocketError::ConnectionClosed),
            }
        }
    }

    /// Close the connection gracefully
    pub async fn close(&mut self) -> Result<(), AisStreamWebSocketError> {
        self.ws.close(None).await?;
        Ok(())
    }
}
