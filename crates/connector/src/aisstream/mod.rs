//! aisstream.io vessel position feed
//!
//! Provides WebSocket connectivity to the aisstream.io live AIS stream.

pub mod config;
pub mod connector;
pub mod messages;
pub mod websocket;

pub use config::{parse_bounding_boxes, parse_list, AisStreamConfig, ConfigError, AISSTREAM_WS_URL};
pub use connector::AisStreamConnector;
pub use messages::{
    decode, message_type_label, BoundingBox, Corner, InboundEnvelope, InboundPayload, PositionReport,
    SubscribeRequest, MESSAGE_TYPES, POSITION_REPORT,
};
pub use websocket::{AisStreamWebSocket, AisStreamWebSocketError};
