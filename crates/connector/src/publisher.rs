//! Publisher - appends raw position frames to the partitioned log
//!
//! Keys records by vessel id so every report for a vessel lands in the same
//! partition. Passes through raw bytes - no transformation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, trace};

use aisbridge_middleware::Transport;

use crate::error::WriterError;
use crate::message::OutboundRecord;
use crate::traits::Writer;

/// Default partitioned-log topic
pub const DEFAULT_TOPIC: &str = "ais-position-reports";

const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Writer that publishes keyed records to one topic
pub struct RecordPublisher {
    transport: Arc<dyn Transport>,
    topic: Arc<str>,
    message_count: u64,
}

impl RecordPublisher {
    pub fn new(transport: Arc<dyn Transport>, topic: impl Into<Arc<str>>) -> Self {
        Self {
            transport,
            topic: topic.into(),
            message_count: 0,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Get count of acknowledged records
    pub fn message_count(&self) -> u64 {
        self.message_count
    }
}

#[async_trait]
impl Writer for RecordPublisher {
    async fn write(&mut self, record: &OutboundRecord) -> Result<(), WriterError> {
        let delivery = self
            .transport
            .publish(&self.topic, record.key.as_bytes(), record.value.clone())
            .await
            .map_err(|e| WriterError::WriteFailed(format!("publish failed: {}", e)))?;

        trace!(
            key = %record.key,
            partition = delivery.partition,
            offset = delivery.offset,
            "Record acknowledged"
        );

        self.message_count += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), WriterError> {
        debug!(topic = %self.topic, messages = self.message_count, "RecordPublisher closing");
        self.transport
            .flush(CLOSE_FLUSH_TIMEOUT)
            .await
            .map_err(|e| WriterError::WriteFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aisbridge_middleware::{partition_for_key, InMemoryTransport};

    const POSITION_FRAME: &[u8] = br#"{"MessageType":"PositionReport","Message":{"PositionReport":{"UserID":367123456,"Latitude":51.5,"Longitude":-0.12}}}"#;

    #[tokio::test]
    async fn test_publish_raw_bytes_keyed() {
        let transport = Arc::new(InMemoryTransport::new());
        let mut publisher = RecordPublisher::new(transport.clone(), DEFAULT_TOPIC);
        let mut sub = transport.subscribe(DEFAULT_TOPIC);

        let record = OutboundRecord::new("367123456", POSITION_FRAME.to_vec());
        publisher.write(&record).await.unwrap();

        let received = sub.recv().await.unwrap();
        assert_eq!(received.topic, DEFAULT_TOPIC);
        assert_eq!(received.key.as_ref(), b"367123456");
        assert_eq!(received.payload.as_ref(), POSITION_FRAME);
        assert_eq!(publisher.message_count(), 1);
    }

    #[tokio::test]
    async fn test_same_key_same_partition() {
        let transport = Arc::new(InMemoryTransport::with_partitions(8));
        let mut publisher = RecordPublisher::new(transport.clone(), DEFAULT_TOPIC);

        for i in 0..3 {
            let record = OutboundRecord::new("367123456", format!("frame-{}", i));
            publisher.write(&record).await.unwrap();
        }

        let partition = partition_for_key(b"367123456", 8);
        let records = transport.partition_records(DEFAULT_TOPIC, partition);
        assert_eq!(records.len(), 3);
        let payloads: Vec<_> = records.iter().map(|r| r.payload.clone()).collect();
        assert_eq!(payloads, vec!["frame-0", "frame-1", "frame-2"]);
    }

    #[tokio::test]
    async fn test_publish_failure_is_error() {
        let transport = Arc::new(InMemoryTransport::new());
        transport.set_available(false);
        let mut publisher = RecordPublisher::new(transport.clone(), DEFAULT_TOPIC);

        let record = OutboundRecord::new("1", POSITION_FRAME.to_vec());
        let result = publisher.write(&record).await;

        assert!(matches!(result, Err(WriterError::WriteFailed(_))));
        assert_eq!(publisher.message_count(), 0);
    }

    #[tokio::test]
    async fn test_custom_topic() {
        let transport = Arc::new(InMemoryTransport::new());
        let mut publisher = RecordPublisher::new(transport.clone(), "ais-positions-eu");
        assert_eq!(publisher.topic(), "ais-positions-eu");

        publisher
            .write(&OutboundRecord::new("1", POSITION_FRAME.to_vec()))
            .await
            .unwrap();
        publisher.close().await.unwrap();

        assert_eq!(transport.len("ais-positions-eu"), 1);
        assert!(transport.is_empty(DEFAULT_TOPIC));
    }
}
