use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default broker bootstrap address
pub const DEFAULT_BROKER_ADDRESS: &str = "localhost:9092";
/// Default per-record delivery timeout in milliseconds
pub const DEFAULT_DELIVERY_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportType {
    Kafka,
    Memory,
}

impl FromStr for TransportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "kafka" => Ok(Self::Kafka),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown transport type: {}", other)),
        }
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kafka => f.write_str("kafka"),
            Self::Memory => f.write_str("memory"),
        }
    }
}

/// Partitioned log connection settings
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub transport_type: TransportType,
    /// Bootstrap broker list (host:port, comma separated)
    pub brokers: String,
    /// How long a single publish may wait for the broker acknowledgment
    pub delivery_timeout: Duration,
    pub client_id: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            transport_type: TransportType::Kafka,
            brokers: DEFAULT_BROKER_ADDRESS.to_string(),
            delivery_timeout: Duration::from_millis(DEFAULT_DELIVERY_TIMEOUT_MS),
            client_id: "aisbridge".to_string(),
        }
    }
}
