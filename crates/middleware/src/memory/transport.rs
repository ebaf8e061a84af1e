use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::error::TransportError;
use crate::clock::now_tsc;
use crate::partitioner::partition_for_key;
use crate::transport::{Delivery, Transport, TransportMessage};

const CHANNEL_BUFFER_SIZE: usize = 1024;

/// Default partition count for topics created on first publish
pub const DEFAULT_PARTITIONS: u32 = 6;
/// Default number of records kept per partition; older records are evicted
pub const DEFAULT_RETENTION: usize = 10_000;

#[derive(Default)]
struct PartitionLog {
    records: VecDeque<TransportMessage>,
    next_offset: i64,
}

impl PartitionLog {
    /// Append at the next offset, evicting the oldest records beyond `retention`
    fn append(&mut self, mut msg: TransportMessage, retention: usize) -> TransportMessage {
        msg.offset = self.next_offset;
        self.next_offset += 1;
        if retention == 0 {
            return msg;
        }
        while self.records.len() >= retention {
            self.records.pop_front();
        }
        self.records.push_back(msg.clone());
        msg
    }
}

struct TopicLog {
    partitions: Vec<PartitionLog>,
    tx: broadcast::Sender<TransportMessage>,
}

impl TopicLog {
    fn new(partitions: u32) -> Self {
        Self {
            partitions: (0..partitions).map(|_| PartitionLog::default()).collect(),
            tx: broadcast::channel(CHANNEL_BUFFER_SIZE).0,
        }
    }
}

/// Partitioned log held in memory. Topics are created on first use.
///
/// Each partition keeps at most `retention` records; offsets keep counting past
/// evictions, as on a broker with size-based retention.
pub struct InMemoryTransport {
    topics: DashMap<String, TopicLog>,
    partitions: u32,
    retention: usize,
    available: AtomicBool,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::with_partitions(DEFAULT_PARTITIONS)
    }

    pub fn with_partitions(partitions: u32) -> Self {
        assert!(partitions > 0, "partition count must be positive");
        Self {
            topics: DashMap::new(),
            partitions,
            retention: DEFAULT_RETENTION,
            available: AtomicBool::new(true),
        }
    }

    /// Cap the records kept per partition. Zero keeps nothing; subscribers still
    /// see every record.
    pub fn with_retention(mut self, retention: usize) -> Self {
        self.retention = retention;
        self
    }

    pub fn partitions(&self) -> u32 {
        self.partitions
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    /// Simulate the broker going away (or coming back). While unavailable every
    /// publish fails.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Receive records appended to `topic` after this call
    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<TransportMessage> {
        self.topics
            .entry(topic.to_string())
            .or_insert_with(|| TopicLog::new(self.partitions))
            .tx
            .subscribe()
    }

    /// Snapshot of the retained records of one partition, in offset order
    pub fn partition_records(&self, topic: &str, partition: i32) -> Vec<TransportMessage> {
        self.topics
            .get(topic)
            .and_then(|log| {
                usize::try_from(partition)
                    .ok()
                    .and_then(|p| log.partitions.get(p))
                    .map(|p| p.records.iter().cloned().collect())
            })
            .unwrap_or_default()
    }

    /// Snapshot of every retained record in `topic`, partition by partition
    pub fn records(&self, topic: &str) -> Vec<TransportMessage> {
        self.topics
            .get(topic)
            .map(|log| {
                log.partitions
                    .iter()
                    .flat_map(|p| p.records.iter().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of records currently retained for `topic`
    pub fn len(&self, topic: &str) -> usize {
        self.topics
            .get(topic)
            .map(|log| log.partitions.iter().map(|p| p.records.len()).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, topic: &str) -> bool {
        self.len(topic) == 0
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn publish(
        &self,
        topic: &str,
        key: &[u8],
        payload: Bytes,
    ) -> Result<Delivery, TransportError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(TransportError::PublishFailed(
                "broker unavailable".to_string(),
            ));
        }

        let partition = partition_for_key(key, self.partitions);
        let mut log = self
            .topics
            .entry(topic.to_string())
            .or_insert_with(|| TopicLog::new(self.partitions));

        let msg = TransportMessage {
            topic: topic.to_string(),
            key: Bytes::copy_from_slice(key),
            payload,
            partition,
            offset: 0,
            timestamp: now_tsc(),
        };
        let msg = log.partitions[partition as usize].append(msg, self.retention);
        let offset = msg.offset;
        let _ = log.tx.send(msg);

        Ok(Delivery { partition, offset })
    }

    async fn flush(&self, _timeout: Duration) -> Result<(), TransportError> {
        Ok(())
    }
}
