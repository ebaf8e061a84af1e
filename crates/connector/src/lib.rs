//! aisbridge-connector: AIS feed ingestion runtime components
//!
//! This crate provides the components for connecting to the aisstream.io vessel
//! position feed, decoding its messages, and republishing position reports to a
//! partitioned log.

pub mod aisstream;
pub mod error;
pub mod message;
pub mod metrics;
pub mod publisher;
pub mod runner;
pub mod server;
pub mod traits;

pub use error::{ConnectorError, DecodeError, WriterError};
pub use message::OutboundRecord;
pub use publisher::{RecordPublisher, DEFAULT_TOPIC};
pub use runner::{PipelineState, PipelineStats, Runner};
pub use server::{create_router, run_server, ServerState};
pub use traits::{Connector, Writer};
