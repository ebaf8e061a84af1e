//! Prometheus metrics for the pipeline
//!
//! Delivery accounting per feed: frames read, records published or dropped, and
//! publish latency.

use once_cell::sync::Lazy;
use prometheus::{
    register_gauge_vec, register_histogram_vec, register_int_counter_vec, register_int_gauge_vec,
    Encoder, GaugeVec, HistogramVec, IntCounterVec, IntGaugeVec, TextEncoder,
};

use crate::aisstream::message_type_label;

/// Labels used for metrics
const LABEL_FEED: &str = "feed";
const LABEL_MESSAGE_TYPE: &str = "message_type";
const LABEL_RESULT: &str = "result";
const LABEL_REASON: &str = "reason";

/// Frames read from the upstream connection
static FRAMES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "aisbridge_frames_total",
        "Total frames received from the feed",
        &[LABEL_FEED]
    )
    .expect("Failed to register frames_total metric")
});

/// Decoded envelopes per message type
static MESSAGES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "aisbridge_messages_total",
        "Total decoded messages by message type",
        &[LABEL_FEED, LABEL_MESSAGE_TYPE]
    )
    .expect("Failed to register messages_total metric")
});

/// Frames that failed to decode
static DECODE_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "aisbridge_decode_errors_total",
        "Total frames dropped because they failed to decode",
        &[LABEL_FEED, LABEL_REASON]
    )
    .expect("Failed to register decode_errors_total metric")
});

/// Publish outcomes (ok / error)
static PUBLISH_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "aisbridge_publish_total",
        "Total publish attempts by result",
        &[LABEL_FEED, LABEL_RESULT]
    )
    .expect("Failed to register publish_total metric")
});

/// Publish round trip latency
static PUBLISH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "aisbridge_publish_duration_seconds",
        "Time from publish call to broker acknowledgment",
        &[LABEL_FEED],
        vec![0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0]
    )
    .expect("Failed to register publish_duration metric")
});

/// Upstream connection status (1 = streaming, 0 = not)
static CONNECTED: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "aisbridge_connected",
        "Upstream feed connection status (1=streaming, 0=not)",
        &[LABEL_FEED]
    )
    .expect("Failed to register connected metric")
});

/// Last frame timestamp (epoch seconds)
static LAST_FRAME_TIMESTAMP: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "aisbridge_last_frame_timestamp",
        "Unix timestamp of the last frame received",
        &[LABEL_FEED]
    )
    .expect("Failed to register last_frame_timestamp metric")
});

/// Handle for recording metrics for one pipeline
#[derive(Clone)]
pub struct PipelineMetrics {
    feed: String,
}

impl PipelineMetrics {
    pub fn new(feed: impl Into<String>) -> Self {
        Self { feed: feed.into() }
    }

    pub fn inc_frame(&self) {
        FRAMES_TOTAL.with_label_values(&[&self.feed]).inc();
    }

    /// Count a decoded envelope. Kinds outside the feed's catalog share the
    /// `other` label.
    pub fn inc_message(&self, message_type: &str) {
        MESSAGES_TOTAL
            .with_label_values(&[&self.feed, message_type_label(message_type)])
            .inc();
    }

    pub fn inc_decode_error(&self, reason: &str) {
        DECODE_ERRORS_TOTAL
            .with_label_values(&[&self.feed, reason])
            .inc();
    }

    pub fn inc_published(&self) {
        PUBLISH_TOTAL.with_label_values(&[&self.feed, "ok"]).inc();
    }

    pub fn inc_publish_failed(&self) {
        PUBLISH_TOTAL.with_label_values(&[&self.feed, "error"]).inc();
    }

    pub fn observe_publish_duration(&self, seconds: f64) {
        PUBLISH_DURATION
            .with_label_values(&[&self.feed])
            .observe(seconds);
    }

    pub fn set_connected(&self, connected: bool) {
        CONNECTED
            .with_label_values(&[&self.feed])
            .set(i64::from(connected));
    }

    pub fn set_last_frame(&self, epoch_secs: f64) {
        LAST_FRAME_TIMESTAMP
            .with_label_values(&[&self.feed])
            .set(epoch_secs);
    }
}

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| {
        prometheus::Error::Msg(format!("Failed to encode metrics as UTF-8: {}", e))
    })
}
