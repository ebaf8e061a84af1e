use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::types::RDKafkaRespErr;
use rdkafka::util::Timeout;
use tracing::{debug, info, warn};

use crate::config::TransportConfig;
use crate::error::TransportError;
use crate::transport::{Delivery, Transport};

/// Pause between metadata requests while a topic is being auto-created
const METADATA_RETRY_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, PartialEq, Eq)]
enum TopicStatus {
    Ready,
    /// Leader election still running, typically right after auto-creation
    Pending,
    Failed(String),
}

fn topic_status(error: Option<RDKafkaRespErr>) -> TopicStatus {
    match error {
        None => TopicStatus::Ready,
        Some(RDKafkaRespErr::RD_KAFKA_RESP_ERR_LEADER_NOT_AVAILABLE) => TopicStatus::Pending,
        Some(err) => TopicStatus::Failed(format!("{:?}", err)),
    }
}

/// Kafka transport backed by a librdkafka `FutureProducer`.
///
/// Every publish awaits the broker acknowledgment (`acks=all`) before returning.
pub struct KafkaTransport {
    producer: FutureProducer,
    delivery_timeout: Duration,
}

impl KafkaTransport {
    /// Create a producer for the configured brokers.
    ///
    /// librdkafka connects lazily; use [`KafkaTransport::validate_topic`] to check
    /// that the broker is actually reachable.
    pub fn connect(config: &TransportConfig) -> Result<Self, TransportError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("client.id", &config.client_id)
            .set("acks", "all")
            .set("partitioner", "murmur2_random")
            .set(
                "message.timeout.ms",
                config.delivery_timeout.as_millis().to_string(),
            )
            .create()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        info!(brokers = %config.brokers, "Kafka producer created");

        Ok(Self {
            producer,
            delivery_timeout: config.delivery_timeout,
        })
    }

    /// Fetch metadata for `topic` and return its partition count.
    ///
    /// A topic that is still electing a leader (the broker auto-created it on this
    /// request) is polled until the delivery timeout, then accepted with a warning.
    pub async fn validate_topic(&self, topic: &str) -> Result<usize, TransportError> {
        let producer = self.producer.clone();
        let topic_name = topic.to_string();
        let timeout = self.delivery_timeout;

        tokio::task::spawn_blocking(move || {
            let deadline = Instant::now() + timeout;
            loop {
                let metadata = producer
                    .client()
                    .fetch_metadata(Some(&topic_name), timeout)
                    .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

                let topic_meta = metadata
                    .topics()
                    .iter()
                    .find(|t| t.name() == topic_name)
                    .ok_or_else(|| {
                        TransportError::ValidationFailed(format!("topic {} not found", topic_name))
                    })?;

                match topic_status(topic_meta.error()) {
                    TopicStatus::Ready => return Ok(topic_meta.partitions().len()),
                    TopicStatus::Failed(reason) => {
                        return Err(TransportError::ValidationFailed(format!(
                            "topic {}: {}",
                            topic_name, reason
                        )))
                    }
                    TopicStatus::Pending if Instant::now() >= deadline => {
                        warn!(topic = %topic_name, "Topic leader not yet available, continuing");
                        return Ok(topic_meta.partitions().len());
                    }
                    TopicStatus::Pending => {
                        debug!(topic = %topic_name, "Topic leader not available, retrying");
                        std::thread::sleep(METADATA_RETRY_INTERVAL);
                    }
                }
            }
        })
        .await
        .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?
    }
}

#[async_trait]
impl Transport for KafkaTransport {
    async fn publish(
        &self,
        topic: &str,
        key: &[u8],
        payload: Bytes,
    ) -> Result<Delivery, TransportError> {
        let record = FutureRecord::to(topic).key(key).payload(payload.as_ref());

        match self
            .producer
            .send(record, Timeout::After(self.delivery_timeout))
            .await
        {
            Ok((partition, offset)) => Ok(Delivery { partition, offset }),
            Err((e, _)) => Err(TransportError::PublishFailed(e.to_string())),
        }
    }

    async fn flush(&self, timeout: Duration) -> Result<(), TransportError> {
        let producer = self.producer.clone();
        tokio::task::spawn_blocking(move || producer.flush(Timeout::After(timeout)))
            .await
            .map_err(|e| TransportError::FlushFailed(e.to_string()))?
            .map_err(|e| TransportError::FlushFailed(e.to_string()))?;
        debug!("Kafka producer flushed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Note: publish tests require a running Kafka broker
    // Run: docker run -p 9092:9092 apache/kafka:latest

    #[test]
    fn test_connect_is_lazy() {
        let config = TransportConfig {
            brokers: "127.0.0.1:1".to_string(),
            ..Default::default()
        };
        assert!(KafkaTransport::connect(&config).is_ok());
    }

    #[test]
    fn test_topic_status_classification() {
        assert_eq!(topic_status(None), TopicStatus::Ready);
        assert_eq!(
            topic_status(Some(RDKafkaRespErr::RD_KAFKA_RESP_ERR_LEADER_NOT_AVAILABLE)),
            TopicStatus::Pending
        );
        assert!(matches!(
            topic_status(Some(RDKafkaRespErr::RD_KAFKA_RESP_ERR_TOPIC_AUTHORIZATION_FAILED)),
            TopicStatus::Failed(_)
        ));
        assert!(matches!(
            topic_status(Some(RDKafkaRespErr::RD_KAFKA_RESP_ERR_UNKNOWN_TOPIC_OR_PART)),
            TopicStatus::Failed(_)
        ));
    }

    #[tokio::test]
    #[ignore] // Requires Kafka broker
    async fn test_publish_succeeds() {
        let transport = KafkaTransport::connect(&TransportConfig::default()).unwrap();
        let result = transport
            .publish("aisbridge-test", b"1", Bytes::from("hello"))
            .await;
        assert!(result.is_ok());
    }
}
