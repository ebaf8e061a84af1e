//! aisstream.io websocket message types
//!
//! Outbound: the subscription request sent once per connection.
//! Inbound: `{"MessageType": ..., "Message": {...}, "MetaData": {...}}` envelopes. Only
//! `PositionReport` payloads are decoded; every other kind is recognized and ignored.

use std::fmt;

use serde::de::{Error as _, Unexpected};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::value::RawValue;

use crate::error::DecodeError;

/// Message kind carrying vessel position reports
pub const POSITION_REPORT: &str = "PositionReport";

/// Every `MessageType` aisstream.io publishes
pub const MESSAGE_TYPES: &[&str] = &[
    "PositionReport",
    "UnknownMessage",
    "AddressedSafetyMessage",
    "AddressedBinaryMessage",
    "AidsToNavigationReport",
    "AssignedModeCommand",
    "BaseStationReport",
    "BinaryAcknowledge",
    "BinaryBroadcastMessage",
    "ChannelManagement",
    "CoordinatedUTCInquiry",
    "DataLinkManagementMessage",
    "DataLinkManagementMessageData",
    "ExtendedClassBPositionReport",
    "GroupAssignmentCommand",
    "GnssBroadcastBinaryMessage",
    "Interrogation",
    "LongRangeAisBroadcastMessage",
    "MultiSlotBinaryMessage",
    "SafetyBroadcastMessage",
    "ShipStaticData",
    "SingleSlotBinaryMessage",
    "StandardClassBPositionReport",
    "StandardSearchAndRescueAircraftReport",
    "StaticDataReport",
];

/// Bounded label for a message kind: known kinds map to themselves, anything
/// else to `"other"`.
pub fn message_type_label(message_type: &str) -> &'static str {
    MESSAGE_TYPES
        .iter()
        .copied()
        .find(|known| *known == message_type)
        .unwrap_or("other")
}

/// A (latitude, longitude) corner, serialized as `[lat, lon]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corner {
    pub latitude: f64,
    pub longitude: f64,
}

impl Corner {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Rectangular filter region, serialized as `[[lat, lon], [lat, lon]]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub first: Corner,
    pub second: Corner,
}

impl BoundingBox {
    pub fn new(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Self {
        Self {
            first: Corner {
                latitude: lat1,
                longitude: lon1,
            },
            second: Corner {
                latitude: lat2,
                longitude: lon2,
            },
        }
    }

    /// The whole globe
    pub fn world() -> Self {
        Self::new(-90.0, -180.0, 90.0, 180.0)
    }

    pub fn is_valid(&self) -> bool {
        self.first.is_valid() && self.second.is_valid()
    }
}

impl Serialize for BoundingBox {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [
            [self.first.latitude, self.first.longitude],
            [self.second.latitude, self.second.longitude],
        ]
        .serialize(serializer)
    }
}

/// First outbound frame on every connection
#[derive(Clone, Serialize)]
pub struct SubscribeRequest {
    #[serde(rename = "APIKey")]
    pub api_key: String,
    #[serde(rename = "BoundingBoxes")]
    pub bounding_boxes: Vec<BoundingBox>,
    #[serde(rename = "FiltersShipMMSI", skip_serializing_if = "Vec::is_empty")]
    pub filter_mmsi: Vec<String>,
    #[serde(rename = "FilterMessageTypes", skip_serializing_if = "Vec::is_empty")]
    pub filter_message_types: Vec<String>,
}

// Keeps the credential out of logs.
impl fmt::Debug for SubscribeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscribeRequest")
            .field("api_key", &"<redacted>")
            .field("bounding_boxes", &self.bounding_boxes)
            .field("filter_mmsi", &self.filter_mmsi)
            .field("filter_message_types", &self.filter_message_types)
            .finish()
    }
}

/// Vessel position. Ranges are not validated; values pass through as received.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PositionReport {
    #[serde(rename = "UserID")]
    pub user_id: i64,
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundPayload {
    PositionReport(PositionReport),
    /// Any other message kind. Valid, but not modeled.
    Other,
}

/// Decoded inbound frame
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEnvelope {
    pub message_type: String,
    pub payload: InboundPayload,
}

impl InboundEnvelope {
    /// The position report carried by this envelope, if any
    #[inline]
    pub fn position_report(&self) -> Option<&PositionReport> {
        match &self.payload {
            InboundPayload::PositionReport(report) => Some(report),
            InboundPayload::Other => None,
        }
    }
}

#[derive(Deserialize)]
struct RawEnvelope<'a> {
    #[serde(rename = "MessageType")]
    message_type: Option<String>,
    #[serde(rename = "Message", borrow, default)]
    message: Option<&'a RawValue>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct PositionReportBody<'a> {
    #[serde(rename = "PositionReport", borrow)]
    position_report: &'a RawValue,
}

/// Deserialize `json` as `T`, accepting only a JSON object. Derived struct impls
/// would otherwise also take a positional array.
fn from_object<'a, T: Deserialize<'a>>(json: &'a [u8]) -> Result<T, serde_json::Error> {
    match json.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') | None => serde_json::from_slice(json),
        Some(_) => Err(serde_json::Error::invalid_type(
            Unexpected::Other("non-object JSON value"),
            &"a JSON object",
        )),
    }
}

fn decode_position_report(message: &RawValue) -> Result<PositionReport, serde_json::Error> {
    let body: PositionReportBody = from_object(message.get().as_bytes())?;
    from_object(body.position_report.get().as_bytes())
}

/// Parse a raw frame into an envelope.
///
/// The nested payload is only parsed for `PositionReport`; a position envelope with a
/// missing or incomplete payload is an error rather than a zero-valued report.
pub fn decode(raw: &[u8]) -> Result<InboundEnvelope, DecodeError> {
    let envelope: RawEnvelope = from_object(raw).map_err(DecodeError::Malformed)?;

    let message_type = match (envelope.message_type, envelope.error) {
        (Some(message_type), _) => message_type,
        (None, Some(reason)) => return Err(DecodeError::Rejected(reason)),
        (None, None) => {
            return Err(DecodeError::Malformed(serde_json::Error::missing_field(
                "MessageType",
            )))
        }
    };

    if message_type != POSITION_REPORT {
        return Ok(InboundEnvelope {
            message_type,
            payload: InboundPayload::Other,
        });
    }

    let message = envelope.message.ok_or_else(|| DecodeError::MissingPayload {
        message_type: message_type.clone(),
    })?;

    match decode_position_report(message) {
        Ok(report) => Ok(InboundEnvelope {
            message_type,
            payload: InboundPayload::PositionReport(report),
        }),
        Err(source) => Err(DecodeError::Payload {
            message_type,
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POSITION_FRAME: &str = r#"{"MessageType":"PositionReport","Message":{"PositionReport":{"UserID":367123456,"Latitude":51.5,"Longitude":-0.12}}}"#;
    const STATIC_DATA_FRAME: &str = r#"{"MessageType":"ShipStaticData","Message":{}}"#;

    // Shape of a live aisstream.io frame, trimmed
    const LIVE_POSITION_FRAME: &str = r#"{"Message":{"PositionReport":{"Cog":308,"CommunicationState":81982,"Latitude":66.02695,"Longitude":12.253821666666665,"MessageID":1,"NavigationalStatus":15,"PositionAccuracy":true,"Raim":false,"RateOfTurn":4,"RepeatIndicator":0,"Sog":0,"Spare":0,"SpecialManoeuvreIndicator":0,"Timestamp":31,"TrueHeading":235,"UserID":259000420,"Valid":true}},"MessageType":"PositionReport","MetaData":{"MMSI":259000420,"ShipName":"AUGUSTSON","latitude":66.02695,"longitude":12.253821666666665,"time_utc":"2022-12-29 18:22:32.318353 +0000 UTC"}}"#;

    #[test]
    fn test_decode_position_report() {
        let envelope = decode(POSITION_FRAME.as_bytes()).unwrap();
        assert_eq!(envelope.message_type, POSITION_REPORT);

        let report = envelope.position_report().unwrap();
        assert_eq!(report.user_id, 367123456);
        assert_eq!(report.latitude, 51.5);
        assert_eq!(report.longitude, -0.12);
    }

    #[test]
    fn test_decode_live_frame_ignores_extra_fields() {
        let envelope = decode(LIVE_POSITION_FRAME.as_bytes()).unwrap();
        let report = envelope.position_report().unwrap();
        assert_eq!(report.user_id, 259000420);
        assert_eq!(report.latitude, 66.02695);
    }

    #[test]
    fn test_other_kind_has_no_report() {
        let envelope = decode(STATIC_DATA_FRAME.as_bytes()).unwrap();
        assert_eq!(envelope.message_type, "ShipStaticData");
        assert_eq!(envelope.payload, InboundPayload::Other);
        assert!(envelope.position_report().is_none());
    }

    #[test]
    fn test_other_kind_without_message_is_valid() {
        let envelope = decode(br#"{"MessageType":"StandardClassBPositionReport"}"#).unwrap();
        assert!(envelope.position_report().is_none());
    }

    #[test]
    fn test_truncated_json_is_malformed() {
        let result = decode(br#"{"MessageType":"#);
        assert!(matches!(result, Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_message_type_label_is_bounded() {
        assert_eq!(message_type_label("PositionReport"), "PositionReport");
        assert_eq!(message_type_label("ShipStaticData"), "ShipStaticData");
        assert_eq!(message_type_label("positionreport"), "other");
        assert_eq!(message_type_label("Surprise-1234"), "other");
    }

    #[test]
    fn test_array_frame_is_malformed() {
        let result = decode(
            br#"["PositionReport",{"PositionReport":{"UserID":42,"Latitude":1.0,"Longitude":2.0}},null]"#,
        );
        assert!(matches!(result, Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_scalar_and_empty_frames_are_malformed() {
        assert!(matches!(decode(b"42"), Err(DecodeError::Malformed(_))));
        assert!(matches!(decode(br#""PositionReport""#), Err(DecodeError::Malformed(_))));
        assert!(matches!(decode(b"  "), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_position_payload_as_array_is_rejected() {
        let result = decode(
            br#"{"MessageType":"PositionReport","Message":{"PositionReport":[42,1.0,2.0]}}"#,
        );
        assert!(matches!(result, Err(DecodeError::Payload { .. })));

        let result = decode(
            br#"{"MessageType":"PositionReport","Message":[{"UserID":42,"Latitude":1.0,"Longitude":2.0}]}"#,
        );
        assert!(matches!(result, Err(DecodeError::Payload { .. })));
    }

    #[test]
    fn test_missing_message_type_is_malformed() {
        let result = decode(br#"{"Message":{}}"#);
        assert!(matches!(result, Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_error_frame_is_rejected() {
        let result = decode(br#"{"error":"Api Key Is Not Valid"}"#);
        match result {
            Err(DecodeError::Rejected(reason)) => assert_eq!(reason, "Api Key Is Not Valid"),
            other => panic!("Expected Rejected, got {:?}", other),
        }
    }

    #[test]
    fn test_position_without_payload() {
        let result = decode(br#"{"MessageType":"PositionReport"}"#);
        assert!(matches!(result, Err(DecodeError::MissingPayload { .. })));
    }

    #[test]
    fn test_position_with_empty_payload() {
        let result = decode(br#"{"MessageType":"PositionReport","Message":{}}"#);
        assert!(matches!(result, Err(DecodeError::Payload { .. })));
    }

    #[test]
    fn test_position_missing_user_id() {
        let result = decode(
            br#"{"MessageType":"PositionReport","Message":{"PositionReport":{"Latitude":1.0,"Longitude":2.0}}}"#,
        );
        assert!(matches!(result, Err(DecodeError::Payload { .. })));
    }

    #[test]
    fn test_zero_coordinates_pass_through() {
        let envelope = decode(
            br#"{"MessageType":"PositionReport","Message":{"PositionReport":{"UserID":1,"Latitude":0,"Longitude":0}}}"#,
        )
        .unwrap();
        let report = envelope.position_report().unwrap();
        assert_eq!(report.latitude, 0.0);
        assert_eq!(report.longitude, 0.0);
    }

    #[test]
    fn test_out_of_range_coordinates_pass_through() {
        // AIS uses 91/181 as "not available"
        let envelope = decode(
            br#"{"MessageType":"PositionReport","Message":{"PositionReport":{"UserID":2,"Latitude":91,"Longitude":181}}}"#,
        )
        .unwrap();
        let report = envelope.position_report().unwrap();
        assert_eq!(report.latitude, 91.0);
        assert_eq!(report.longitude, 181.0);
    }

    #[test]
    fn test_subscribe_request_wire_format() {
        let request = SubscribeRequest {
            api_key: "test-key".to_string(),
            bounding_boxes: vec![BoundingBox::world()],
            filter_mmsi: vec![],
            filter_message_types: vec![],
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(
            json,
            r#"{"APIKey":"test-key","BoundingBoxes":[[[-90.0,-180.0],[90.0,180.0]]]}"#
        );
    }

    #[test]
    fn test_subscribe_request_with_filters() {
        let request = SubscribeRequest {
            api_key: "k".to_string(),
            bounding_boxes: vec![BoundingBox::new(51.0, -1.0, 52.5, 0.5)],
            filter_mmsi: vec!["367123456".to_string()],
            filter_message_types: vec![POSITION_REPORT.to_string()],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["BoundingBoxes"][0][1][0], 52.5);
        assert_eq!(value["FiltersShipMMSI"][0], "367123456");
        assert_eq!(value["FilterMessageTypes"][0], "PositionReport");
    }

    #[test]
    fn test_subscribe_request_debug_redacts_key() {
        let request = SubscribeRequest {
            api_key: "super-secret".to_string(),
            bounding_boxes: vec![BoundingBox::world()],
            filter_mmsi: vec![],
            filter_message_types: vec![],
        };
        let debug = format!("{:?}", request);
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn test_bounding_box_validity() {
        assert!(BoundingBox::world().is_valid());
        assert!(!BoundingBox::new(-91.0, 0.0, 0.0, 0.0).is_valid());
        assert!(!BoundingBox::new(0.0, 0.0, 0.0, 180.5).is_valid());
        assert!(!BoundingBox::new(f64::NAN, 0.0, 0.0, 0.0).is_valid());
    }
}
