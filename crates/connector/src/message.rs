use bytes::Bytes;

use crate::aisstream::PositionReport;

/// Record bound for the partitioned log.
/// The value is the frame exactly as received; it is never re-serialized.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRecord {
    /// Partition key: decimal string form of the entity identifier
    pub key: String,
    /// Raw frame bytes
    pub value: Bytes,
}

impl OutboundRecord {
    pub fn new(key: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Build the record for a position report, keyed by its vessel id
    #[inline]
    pub fn for_position(report: &PositionReport, raw: impl Into<Bytes>) -> Self {
        Self::new(report.user_id.to_string(), raw)
    }
}
