//! aisstream.io connector implementation
//!
//! Implements the Connector trait over a single websocket connection. No reconnect:
//! once the stream fails the connector is spent.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tracing::{error, info};

use crate::aisstream::config::AisStreamConfig;
use crate::aisstream::websocket::{AisStreamWebSocket, AisStreamWebSocketError};
use crate::error::ConnectorError;
use crate::traits::Connector;

/// aisstream.io connector implementing the Connector trait
pub struct AisStreamConnector {
    config: AisStreamConfig,
    ws: Option<AisStreamWebSocket>,
    /// Last WebSocket activity timestamp (epoch seconds)
    last_ws_activity_epoch_secs: Arc<AtomicU64>,
}

impl AisStreamConnector {
    pub fn new(config: AisStreamConfig) -> Self {
        Self {
            config,
            ws: None,
            last_ws_activity_epoch_secs: Arc::new(AtomicU64::new(0)),
        }
    }

    fn update_activity(&self) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.last_ws_activity_epoch_secs.store(now, Ordering::SeqCst);
    }

    fn ws_mut(&mut self) -> Result<&mut AisStreamWebSocket, ConnectorError> {
        self.ws
            .as_mut()
            .ok_or_else(|| ConnectorError::Disconnected("not connected".to_string()))
    }
}

#[async_trait]
impl Connector for AisStreamConnector {
    async fn connect(&mut self) -> Result<(), ConnectorError> {
        if self.ws.is_some() {
            return Err(ConnectorError::ConnectionFailed(
                "connect() called twice".to_string(),
            ));
        }

        let ws = AisStreamWebSocket::connect(&self.config.url, self.config.read_timeout)
            .await
            .map_err(|e| ConnectorError::ConnectionFailed(e.to_string()))?
            .with_activity(Arc::clone(&self.last_ws_activity_epoch_secs));

        self.ws = Some(ws);
        self.update_activity();
        Ok(())
    }

    async fn subscribe(&mut self) -> Result<(), ConnectorError> {
        let request = self.config.subscribe_request();
        self.ws_mut()?
            .subscribe(&request)
            .await
            .map_err(|e| ConnectorError::SubscribeFailed(e.to_string()))?;

        info!(
            bounding_boxes = ?request.bounding_boxes,
            "aisstream.io subscription sent"
        );
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Vec<u8>, ConnectorError> {
        let result = self.ws_mut()?.recv_frame().await;
        result.map_err(|e| {
            // The socket is unusable after any read failure
            self.ws = None;
            match e {
                AisStreamWebSocketError::ConnectionClosed => {
                    error!("aisstream.io WebSocket connection closed");
                    ConnectorError::Disconnected(e.to_string())
                }
                other => {
                    error!(error = %other, "aisstream.io WebSocket error");
                    ConnectorError::ReadFailed(other.to_string())
                }
            }
        })
    }

    async fn close(&mut self) -> Result<(), ConnectorError> {
        if let Some(mut ws) = self.ws.take() {
            ws.close()
                .await
                .map_err(|e| ConnectorError::Disconnected(e.to_string()))?;
        }
        Ok(())
    }

    fn activity_handle(&self) -> Option<Arc<AtomicU64>> {
        Some(Arc::clone(&self.last_ws_activity_epoch_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aisstream::messages::BoundingBox;

    fn test_config() -> AisStreamConfig {
        AisStreamConfig::new("test-key", vec![BoundingBox::world()]).unwrap()
    }

    #[test]
    fn test_connector_creation() {
        let connector = AisStreamConnector::new(test_config());
        assert!(connector.ws.is_none());
        assert_eq!(connector.config.bounding_boxes.len(), 1);
    }

    #[test]
    fn test_connector_activity_handle() {
        let connector = AisStreamConnector::new(test_config());
        let handle = connector.activity_handle().unwrap();
        assert_eq!(handle.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_subscribe_before_connect_fails() {
        let mut connector = AisStreamConnector::new(test_config());
        let result = connector.subscribe().await;
        assert!(matches!(result, Err(ConnectorError::Disconnected(_))));
    }

    #[tokio::test]
    async fn test_next_frame_before_connect_fails() {
        let mut connector = AisStreamConnector::new(test_config());
        let result = connector.next_frame().await;
        assert!(matches!(result, Err(ConnectorError::Disconnected(_))));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let mut connector = AisStreamConnector::new(test_config().with_url("ws://127.0.0.1:1"));
        let result = connector.connect().await;
        assert!(matches!(result, Err(ConnectorError::ConnectionFailed(_))));
    }

    #[tokio::test]
    async fn test_close_without_connection() {
        let mut connector = AisStreamConnector::new(test_config());
        assert!(connector.close().await.is_ok());
    }
}
