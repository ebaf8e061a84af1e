use std::sync::Arc;

use tracing::info;

use crate::config::{TransportConfig, TransportType};
use crate::error::TransportError;
use crate::kafka::KafkaTransport;
use crate::memory::InMemoryTransport;
use crate::transport::Transport;

/// Error creating middleware
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("configuration error: {0}")]
    ConfigError(String),
}

/// Factory for creating middleware instances from configuration
pub struct MiddlewareFactory;

impl MiddlewareFactory {
    /// Create a transport without touching the network
    pub fn create_transport(config: &TransportConfig) -> Result<Arc<dyn Transport>, FactoryError> {
        match config.transport_type {
            TransportType::Memory => Ok(Arc::new(InMemoryTransport::new())),
            TransportType::Kafka => {
                if config.brokers.trim().is_empty() {
                    return Err(FactoryError::ConfigError(
                        "broker address is empty".to_string(),
                    ));
                }
                Ok(Arc::new(KafkaTransport::connect(config)?))
            }
        }
    }

    /// Create a transport and confirm the broker serves `topic` before returning
    pub async fn create_transport_validated(
        config: &TransportConfig,
        topic: &str,
    ) -> Result<Arc<dyn Transport>, FactoryError> {
        if topic.trim().is_empty() {
            return Err(FactoryError::ConfigError("topic name is empty".to_string()));
        }

        match config.transport_type {
            TransportType::Memory => Self::create_transport(config),
            TransportType::Kafka => {
                if config.brokers.trim().is_empty() {
                    return Err(FactoryError::ConfigError(
                        "broker address is empty".to_string(),
                    ));
                }
                let transport = KafkaTransport::connect(config)?;
                let partitions = transport.validate_topic(topic).await?;
                info!(
                    brokers = %config.brokers,
                    topic = %topic,
                    partitions,
                    "Kafka topic validated"
                );
                Ok(Arc::new(transport))
            }
        }
    }
}
