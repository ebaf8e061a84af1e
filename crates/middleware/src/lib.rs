//! aisbridge-middleware: Partitioned log abstractions
//!
//! Provides a trait-based Transport for keyed, partitioned publishing with a Kafka
//! implementation and an in-memory implementation for testing and dry runs.

pub mod clock;
pub mod config;
pub mod error;
pub mod factory;
pub mod kafka;
pub mod memory;
pub mod partitioner;
pub mod transport;

pub use clock::{elapsed_secs, now_tsc, CLOCK};
pub use config::{TransportConfig, TransportType};
pub use error::TransportError;
pub use factory::{FactoryError, MiddlewareFactory};
pub use kafka::KafkaTransport;
pub use memory::InMemoryTransport;
pub use partitioner::{murmur2, partition_for_key};
pub use transport::{Delivery, Transport, TransportMessage};
