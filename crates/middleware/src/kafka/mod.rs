mod transport;

pub use transport::KafkaTransport;
