use async_trait::async_trait;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use crate::error::{ConnectorError, WriterError};
use crate::message::OutboundRecord;

/// Connector trait for streaming data sources.
///
/// Lifecycle: `connect`, then `subscribe`, then `next_frame` until it fails. A
/// connection is not restartable; once `next_frame` returns an error a fresh
/// connector is required.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establish the transport connection
    async fn connect(&mut self) -> Result<(), ConnectorError>;

    /// Send the subscription request as the first outbound frame
    async fn subscribe(&mut self) -> Result<(), ConnectorError>;

    /// Wait for the next raw frame. Fails on transport error or peer close.
    async fn next_frame(&mut self) -> Result<Vec<u8>, ConnectorError>;

    /// Close the connection
    async fn close(&mut self) -> Result<(), ConnectorError>;

    /// Get handle to last upstream activity timestamp (epoch seconds).
    /// Used for health checks - returns None if connector doesn't track activity.
    fn activity_handle(&self) -> Option<Arc<AtomicU64>> {
        None
    }
}

/// Writer trait for output destinations
#[async_trait]
pub trait Writer: Send + Sync {
    /// Write a record and wait for the destination to acknowledge it
    async fn write(&mut self, record: &OutboundRecord) -> Result<(), WriterError>;

    /// Close and flush the writer
    async fn close(&mut self) -> Result<(), WriterError>;
}
