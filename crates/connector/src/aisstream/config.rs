//! aisstream.io connector configuration
//!
//! The credential and the subscription regions are required; there is no built-in
//! fallback for either.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::aisstream::messages::{BoundingBox, SubscribeRequest};

/// aisstream.io v0 streaming endpoint
pub const AISSTREAM_WS_URL: &str = "wss://stream.aisstream.io/v0/stream";

/// Default read timeout in seconds
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 120;

/// Keyword selecting the whole-world bounding box
pub const WORLD: &str = "world";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing API key")]
    MissingApiKey,

    #[error("No bounding boxes configured")]
    NoBoundingBoxes,

    #[error("Invalid bounding box '{0}': {1}")]
    InvalidBoundingBox(String, String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// aisstream.io connector configuration
#[derive(Clone)]
pub struct AisStreamConfig {
    pub url: String,
    api_key: String,
    pub bounding_boxes: Vec<BoundingBox>,
    pub filter_mmsi: Vec<String>,
    pub filter_message_types: Vec<String>,
    pub read_timeout: Duration,
}

impl AisStreamConfig {
    /// Create a configuration for the default endpoint.
    ///
    /// Fails if the key is blank, no boxes are given, or any corner is out of range.
    pub fn new(
        api_key: impl Into<String>,
        bounding_boxes: Vec<BoundingBox>,
    ) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if bounding_boxes.is_empty() {
            return Err(ConfigError::NoBoundingBoxes);
        }
        if let Some(bad) = bounding_boxes.iter().find(|b| !b.is_valid()) {
            return Err(ConfigError::InvalidBoundingBox(
                format!("{:?}", bad),
                "coordinates out of range".to_string(),
            ));
        }

        Ok(Self {
            url: AISSTREAM_WS_URL.to_string(),
            api_key,
            bounding_boxes,
            filter_mmsi: Vec::new(),
            filter_message_types: Vec::new(),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn with_mmsi_filter(mut self, mmsi: Vec<String>) -> Self {
        self.filter_mmsi = mmsi;
        self
    }

    pub fn with_message_type_filter(mut self, message_types: Vec<String>) -> Self {
        self.filter_message_types = message_types;
        self
    }

    /// Build the subscription request sent on each new connection
    pub fn subscribe_request(&self) -> SubscribeRequest {
        SubscribeRequest {
            api_key: self.api_key.clone(),
            bounding_boxes: self.bounding_boxes.clone(),
            filter_mmsi: self.filter_mmsi.clone(),
            filter_message_types: self.filter_message_types.clone(),
        }
    }
}

impl fmt::Debug for AisStreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AisStreamConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("bounding_boxes", &self.bounding_boxes)
            .field("filter_mmsi", &self.filter_mmsi)
            .field("filter_message_types", &self.filter_message_types)
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}

/// Parse bounding boxes from `lat,lon,lat,lon;lat,lon,lat,lon` or the `world` keyword
pub fn parse_bounding_boxes(spec: &str) -> Result<Vec<BoundingBox>, ConfigError> {
    let spec = spec.trim();
    if spec.eq_ignore_ascii_case(WORLD) {
        return Ok(vec![BoundingBox::world()]);
    }

    let boxes = spec
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_bounding_box)
        .collect::<Result<Vec<_>, _>>()?;

    if boxes.is_empty() {
        return Err(ConfigError::NoBoundingBoxes);
    }
    Ok(boxes)
}

fn parse_bounding_box(spec: &str) -> Result<BoundingBox, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidBoundingBox(spec.to_string(), reason.to_string());

    let values = spec
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| invalid(&e.to_string()))?;

    let [lat1, lon1, lat2, lon2] = values[..] else {
        return Err(invalid("expected lat,lon,lat,lon"));
    };

    let bbox = BoundingBox::new(lat1, lon1, lat2, lon2);
    if !bbox.is_valid() {
        return Err(invalid("coordinates out of range"));
    }
    Ok(bbox)
}

/// Split a comma separated list, dropping blanks
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new() {
        let config = AisStreamConfig::new("test-key", vec![BoundingBox::world()]).unwrap();
        assert_eq!(config.url, AISSTREAM_WS_URL);
        assert_eq!(config.read_timeout, Duration::from_secs(120));
        assert_eq!(config.subscribe_request().api_key, "test-key");
    }

    #[test]
    fn test_config_blank_key() {
        let result = AisStreamConfig::new("   ", vec![BoundingBox::world()]);
        assert!(matches!(result, Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn test_config_requires_boxes() {
        let result = AisStreamConfig::new("key", vec![]);
        assert!(matches!(result, Err(ConfigError::NoBoundingBoxes)));
    }

    #[test]
    fn test_config_rejects_out_of_range_box() {
        let result = AisStreamConfig::new("key", vec![BoundingBox::new(0.0, 0.0, 95.0, 0.0)]);
        assert!(matches!(result, Err(ConfigError::InvalidBoundingBox(_, _))));
    }

    #[test]
    fn test_config_builders() {
        let config = AisStreamConfig::new("key", vec![BoundingBox::world()])
            .unwrap()
            .with_url("ws://127.0.0.1:9000")
            .with_read_timeout(Duration::from_secs(5))
            .with_mmsi_filter(vec!["367123456".to_string()])
            .with_message_type_filter(vec!["PositionReport".to_string()]);

        let request = config.subscribe_request();
        assert_eq!(config.url, "ws://127.0.0.1:9000");
        assert_eq!(request.filter_mmsi, vec!["367123456"]);
        assert_eq!(request.filter_message_types, vec!["PositionReport"]);
    }

    #[test]
    fn test_parse_world() {
        assert_eq!(parse_bounding_boxes("world").unwrap(), vec![BoundingBox::world()]);
        assert_eq!(parse_bounding_boxes(" WORLD ").unwrap(), vec![BoundingBox::world()]);
    }

    #[test]
    fn test_parse_multiple_boxes() {
        let boxes = parse_bounding_boxes("51.0,-1.0,52.5,0.5; 40.5,-74.5,41.0,-73.5").unwrap();
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0], BoundingBox::new(51.0, -1.0, 52.5, 0.5));
        assert_eq!(boxes[1], BoundingBox::new(40.5, -74.5, 41.0, -73.5));
    }

    #[test]
    fn test_parse_wrong_arity() {
        let result = parse_bounding_boxes("51.0,-1.0,52.5");
        assert!(matches!(result, Err(ConfigError::InvalidBoundingBox(_, _))));
    }

    #[test]
    fn test_parse_non_numeric() {
        let result = parse_bounding_boxes("north,-1.0,52.5,0.5");
        assert!(matches!(result, Err(ConfigError::InvalidBoundingBox(_, _))));
    }

    #[test]
    fn test_parse_out_of_range() {
        let result = parse_bounding_boxes("0,0,0,200");
        assert!(matches!(result, Err(ConfigError::InvalidBoundingBox(_, _))));
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(parse_bounding_boxes(""), Err(ConfigError::NoBoundingBoxes)));
        assert!(matches!(parse_bounding_boxes(" ; "), Err(ConfigError::NoBoundingBoxes)));
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list("a, b,,c "), vec!["a", "b", "c"]);
        assert!(parse_list("").is_empty());
    }
}
