use std::convert::Infallible;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, error, info, trace, warn};

use crate::aisstream::decode;
use crate::error::{ConnectorError, DecodeError};
use crate::message::OutboundRecord;
use crate::metrics::PipelineMetrics;
use crate::traits::{Connector, Writer};
use aisbridge_middleware::{elapsed_secs, now_tsc};

/// Pipeline lifecycle. `Terminated` is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Disconnected,
    Connecting,
    Subscribed,
    Streaming,
    Terminated,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Subscribed => "subscribed",
            Self::Streaming => "streaming",
            Self::Terminated => "terminated",
        };
        f.write_str(s)
    }
}

/// Delivery accounting for one pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub frames: u64,
    pub position_reports: u64,
    pub published: u64,
    pub publish_failures: u64,
    pub decode_failures: u64,
    pub ignored: u64,
}

/// Runner drives the ingest pipeline: read a frame, decode it, publish position
/// reports, repeat. One sequential loop; the publish acknowledgment is awaited before
/// the next read.
pub struct Runner<C: Connector, W: Writer> {
    feed_name: String,
    connector: C,
    writer: W,
    state: PipelineState,
    stats: PipelineStats,
    metrics: PipelineMetrics,
    connected: Arc<AtomicBool>,
    /// Unix timestamp (seconds) of last frame received
    last_message_epoch_secs: Arc<AtomicU64>,
}

impl<C: Connector, W: Writer> Runner<C, W> {
    pub fn new(feed_name: impl Into<String>, connector: C, writer: W) -> Self {
        let feed_name = feed_name.into();
        Self {
            metrics: PipelineMetrics::new(feed_name.clone()),
            feed_name,
            connector,
            writer,
            state: PipelineState::Disconnected,
            stats: PipelineStats::default(),
            connected: Arc::new(AtomicBool::new(false)),
            last_message_epoch_secs: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Returns whether the pipeline is currently streaming
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Returns a handle to the connected status
    pub fn connected_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.connected)
    }

    /// Returns the connector's activity handle if available, falling back to the
    /// Runner's own last-frame timestamp.
    pub fn activity_handle(&self) -> Arc<AtomicU64> {
        self.connector
            .activity_handle()
            .unwrap_or_else(|| Arc::clone(&self.last_message_epoch_secs))
    }

    fn transition(&mut self, next: PipelineState) {
        debug!(feed = %self.feed_name, from = %self.state, to = %next, "Pipeline state change");
        self.state = next;
        let streaming = next == PipelineState::Streaming;
        self.connected.store(streaming, Ordering::SeqCst);
        self.metrics.set_connected(streaming);
    }

    fn terminate(&mut self, err: ConnectorError) -> ConnectorError {
        self.transition(PipelineState::Terminated);
        error!(feed = %self.feed_name, error = %err, stats = ?self.stats, "Pipeline terminated");
        err
    }

    fn update_last_message_time(&self) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.last_message_epoch_secs.store(now, Ordering::SeqCst);
        self.metrics.set_last_frame(now as f64);
    }

    /// Run the pipeline until the upstream connection fails.
    ///
    /// Never returns `Ok`: connect, subscribe, and read failures end the run with a
    /// typed error and leave the runner `Terminated`. Decode and publish failures
    /// are logged per record and do not stop the loop.
    pub async fn run(&mut self) -> Result<Infallible, ConnectorError> {
        if self.state == PipelineState::Terminated {
            return Err(ConnectorError::Terminated);
        }

        self.transition(PipelineState::Connecting);
        if let Err(e) = self.connector.connect().await {
            return Err(self.terminate(e));
        }
        if let Err(e) = self.connector.subscribe().await {
            self.connector.close().await.ok();
            return Err(self.terminate(e));
        }
        self.transition(PipelineState::Subscribed);
        info!(feed = %self.feed_name, "Subscribed to data source");

        self.transition(PipelineState::Streaming);
        loop {
            let frame = match self.connector.next_frame().await {
                Ok(frame) => frame,
                Err(e) => {
                    self.writer.close().await.ok();
                    return Err(self.terminate(e));
                }
            };
            self.process_frame(frame).await;
        }
    }

    async fn process_frame(&mut self, frame: Vec<u8>) {
        self.stats.frames += 1;
        self.metrics.inc_frame();
        self.update_last_message_time();

        let envelope = match decode(&frame) {
            Ok(envelope) => envelope,
            Err(e) => {
                self.stats.decode_failures += 1;
                self.metrics.inc_decode_error(decode_error_reason(&e));
                if let DecodeError::Rejected(_) = e {
                    error!(feed = %self.feed_name, error = %e, "Feed returned an error frame");
                } else {
                    let preview: String = String::from_utf8_lossy(&frame)
                        .chars()
                        .take(200)
                        .collect();
                    warn!(feed = %self.feed_name, error = %e, preview = %preview, "Failed to decode frame");
                }
                return;
            }
        };

        self.metrics.inc_message(&envelope.message_type);

        let Some(report) = envelope.position_report() else {
            self.stats.ignored += 1;
            trace!(message_type = %envelope.message_type, "Ignoring message");
            return;
        };
        self.stats.position_reports += 1;
        debug!(
            ship_id = report.user_id,
            latitude = report.latitude,
            longitude = report.longitude,
            "Position report"
        );

        let record = OutboundRecord::for_position(report, frame);
        let write_start = now_tsc();
        match self.writer.write(&record).await {
            Ok(()) => {
                self.stats.published += 1;
                self.metrics.inc_published();
                self.metrics.observe_publish_duration(elapsed_secs(write_start));
            }
            Err(e) => {
                self.stats.publish_failures += 1;
                self.metrics.inc_publish_failed();
                warn!(feed = %self.feed_name, key = %record.key, error = %e, "Failed to publish record");
            }
        }
    }
}

fn decode_error_reason(err: &DecodeError) -> &'static str {
    match err {
        DecodeError::Malformed(_) => "malformed",
        DecodeError::Payload { .. } => "payload",
        DecodeError::MissingPayload { .. } => "missing_payload",
        DecodeError::Rejected(_) => "rejected",
    }
}
