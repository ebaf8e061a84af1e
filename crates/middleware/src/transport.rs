use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

use crate::error::TransportError;

/// Broker acknowledgment for a single published record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub partition: i32,
    pub offset: i64,
}

/// A record as stored in a partitioned log
#[derive(Debug, Clone)]
pub struct TransportMessage {
    pub topic: String,
    pub key: Bytes,
    pub payload: Bytes,
    pub partition: i32,
    pub offset: i64,
    /// TSC timestamp taken when the record was appended
    pub timestamp: u64,
}

/// Transport abstraction for a keyed, partitioned log
#[async_trait]
pub trait Transport: Send + Sync {
    /// Publish a keyed record and wait for the broker acknowledgment.
    ///
    /// Records with the same key always land in the same partition.
    async fn publish(
        &self,
        topic: &str,
        key: &[u8],
        payload: Bytes,
    ) -> Result<Delivery, TransportError>;

    /// Wait until all in-flight records are acknowledged or the timeout elapses
    async fn flush(&self, timeout: Duration) -> Result<(), TransportError>;
}
