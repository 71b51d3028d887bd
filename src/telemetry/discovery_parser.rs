// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parser for discovery announcements.
//!
//! Tasmota announces each device on `tasmota/discovery/<MAC>/config` with a
//! compact JSON object:
//!
//! ```json
//! {"ip":"192.168.1.42","dn":"Living Room","mac":"AABBCCDDEEFF","md":"ESP32","t":"tasmota_1", ...}
//! ```
//!
//! Which keys hold the name and the topic segment depends on the announcer,
//! so the lookup is driven by a [`DiscoveryMapping`].

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::{first_string, parse_object};
use crate::error::DecodeError;
use crate::protocol::validate_segment;
use crate::types::HardwareAddress;

/// Derives a topic segment from a discovery payload and its topic identifier.
pub type SegmentResolver = Arc<dyn Fn(&Map<String, Value>, &str) -> Option<String> + Send + Sync>;

/// Where the topic segment of a discovery record comes from.
#[derive(Clone)]
pub enum SegmentSource {
    /// The first of these payload keys holding a non-empty string.
    Field(Vec<String>),
    /// The identifier level of the discovery topic itself.
    Identifier,
    /// A caller-supplied function.
    Custom(SegmentResolver),
}

impl fmt::Debug for SegmentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(keys) => f.debug_tuple("Field").field(keys).finish(),
            Self::Identifier => f.write_str("Identifier"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl Default for SegmentSource {
    fn default() -> Self {
        Self::Field(vec!["t".to_string(), "topic".to_string()])
    }
}

/// Key mapping used to decode discovery payloads.
///
/// # Examples
///
/// ```
/// use mielhvac_bridge::telemetry::{DiscoveryMapping, SegmentSource};
///
/// let mapping = DiscoveryMapping::default();
/// let record = mapping
///     .decode("AABB", br#"{"mac":"AA:BB","name":"Living Room","topic":"tasmota_1"}"#)
///     .unwrap();
/// assert_eq!(record.topic_segment, "tasmota_1");
/// assert_eq!(record.display_name, "Living Room");
///
/// // Segment taken from the discovery topic instead
/// let mapping = DiscoveryMapping::default().with_segment_source(SegmentSource::Identifier);
/// let record = mapping.decode("hp_kitchen", br#"{"mac":"CC","dn":"Kitchen"}"#).unwrap();
/// assert_eq!(record.topic_segment, "hp_kitchen");
/// ```
#[derive(Debug, Clone)]
pub struct DiscoveryMapping {
    address_keys: Vec<String>,
    name_keys: Vec<String>,
    segment: SegmentSource,
    model_key: Option<String>,
    ip_key: Option<String>,
}

impl Default for DiscoveryMapping {
    fn default() -> Self {
        Self {
            address_keys: vec!["mac".to_string()],
            name_keys: vec!["dn".to_string(), "name".to_string()],
            segment: SegmentSource::default(),
            model_key: Some("md".to_string()),
            ip_key: Some("ip".to_string()),
        }
    }
}

impl DiscoveryMapping {
    /// Sets the keys searched for the hardware address.
    #[must_use]
    pub fn with_address_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.address_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the keys searched for the display name.
    #[must_use]
    pub fn with_name_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.name_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Sets how the topic segment is derived.
    #[must_use]
    pub fn with_segment_source(mut self, source: SegmentSource) -> Self {
        self.segment = source;
        self
    }

    /// Sets the key holding the hardware model, or `None` to ignore it.
    #[must_use]
    pub fn with_model_key(mut self, key: Option<String>) -> Self {
        self.model_key = key;
        self
    }

    /// Sets the key holding the IP address, or `None` to ignore it.
    #[must_use]
    pub fn with_ip_key(mut self, key: Option<String>) -> Self {
        self.ip_key = key;
        self
    }

    /// Returns the segment source.
    #[must_use]
    pub fn segment_source(&self) -> &SegmentSource {
        &self.segment
    }

    /// Decodes a discovery payload.
    ///
    /// `identifier` is the level between the discovery prefix and suffix.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::MissingField` when the hardware address, the
    /// display name or the topic segment cannot be found, and
    /// `DecodeError::InvalidValue` when the address or segment is unusable.
    /// Nothing is partially decoded.
    pub fn decode(&self, identifier: &str, payload: &[u8]) -> Result<DiscoveryRecord, DecodeError> {
        let map = parse_object(payload)?;

        let raw_address = first_string(&map, &self.address_keys)
            .ok_or_else(|| DecodeError::MissingField(self.address_keys.join("|")))?;
        let hardware_address = HardwareAddress::new(raw_address)?;

        let display_name = first_string(&map, &self.name_keys)
            .ok_or_else(|| DecodeError::MissingField(self.name_keys.join("|")))?
            .to_string();

        let topic_segment = self.resolve_segment(&map, identifier)?;

        let optional = |key: &Option<String>| {
            key.as_ref()
                .and_then(|k| first_string(&map, std::slice::from_ref(k)))
                .map(str::to_string)
        };

        Ok(DiscoveryRecord {
            hardware_address,
            display_name,
            topic_segment,
            model: optional(&self.model_key),
            ip_address: optional(&self.ip_key),
        })
    }

    fn resolve_segment(
        &self,
        map: &Map<String, Value>,
        identifier: &str,
    ) -> Result<String, DecodeError> {
        let segment = match &self.segment {
            SegmentSource::Field(keys) => first_string(map, keys)
                .map(str::to_string)
                .ok_or_else(|| DecodeError::MissingField(keys.join("|")))?,
            SegmentSource::Identifier => identifier.to_string(),
            SegmentSource::Custom(resolve) => resolve(map, identifier)
                .ok_or_else(|| DecodeError::MissingField("topic segment".to_string()))?,
        };
        validate_segment(&segment).map_err(|e| DecodeError::InvalidValue {
            field: "topic segment".to_string(),
            message: e.to_string(),
        })?;
        Ok(segment)
    }
}

/// A decoded discovery announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRecord {
    /// Normalized hardware address.
    pub hardware_address: HardwareAddress,
    /// Human-readable device name.
    pub display_name: String,
    /// Topic segment used in telemetry and command topics.
    pub topic_segment: String,
    /// Hardware model, if announced.
    pub model: Option<String>,
    /// IP address, if announced.
    pub ip_address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const TASMOTA_PAYLOAD: &[u8] = br#"{
        "ip":"192.168.1.42","dn":"Living Room","fn":["Living Room",null],
        "hn":"tasmota-ABCDEF-1234","mac":"A4CF12ABCDEF","md":"ESP32-DevKit",
        "t":"tasmota_ABCDEF","ft":"%prefix%/%topic%/","tp":["cmnd","stat","tele"]
    }"#;

    #[test]
    fn decodes_tasmota_announcement() {
        let record = DiscoveryMapping::default()
            .decode("A4CF12ABCDEF", TASMOTA_PAYLOAD)
            .unwrap();
        assert_eq!(record.hardware_address.as_str(), "A4CF12ABCDEF");
        assert_eq!(record.display_name, "Living Room");
        assert_eq!(record.topic_segment, "tasmota_ABCDEF");
        assert_eq!(record.model.as_deref(), Some("ESP32-DevKit"));
        assert_eq!(record.ip_address.as_deref(), Some("192.168.1.42"));
    }

    #[test]
    fn decodes_minimal_announcement() {
        let record = DiscoveryMapping::default()
            .decode("x", br#"{"mac":"AA:BB","name":"Living Room","topic":"tasmota_1"}"#)
            .unwrap();
        assert_eq!(record.hardware_address.as_str(), "AABB");
        assert_eq!(record.topic_segment, "tasmota_1");
        assert!(record.model.is_none());
        assert!(record.ip_address.is_none());
    }

    #[test]
    fn missing_address_is_error() {
        let err = DiscoveryMapping::default()
            .decode("x", br#"{"name":"Hall","topic":"t"}"#)
            .unwrap_err();
        assert!(matches!(err, DecodeError::MissingField(ref f) if f == "mac"));
    }

    #[test]
    fn missing_name_is_error() {
        let err = DiscoveryMapping::default()
            .decode("x", br#"{"mac":"AA","topic":"t"}"#)
            .unwrap_err();
        assert!(matches!(err, DecodeError::MissingField(_)));
    }

    #[test]
    fn missing_segment_is_error() {
        let err = DiscoveryMapping::default()
            .decode("x", br#"{"mac":"AA","name":"Hall"}"#)
            .unwrap_err();
        assert!(matches!(err, DecodeError::MissingField(ref f) if f == "t|topic"));
    }

    #[test]
    fn segment_with_separator_is_rejected() {
        let err = DiscoveryMapping::default()
            .decode("x", br#"{"mac":"AA","name":"Hall","t":"a/b"}"#)
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidValue { .. }));
    }

    #[test]
    fn identifier_source() {
        let mapping = DiscoveryMapping::default().with_segment_source(SegmentSource::Identifier);
        let record = mapping
            .decode("hp_1", br#"{"mac":"AA","name":"Hall","t":"ignored"}"#)
            .unwrap();
        assert_eq!(record.topic_segment, "hp_1");
    }

    #[test]
    fn custom_source() {
        let resolver: SegmentResolver = Arc::new(|map: &Map<String, Value>, _identifier: &str| {
            map.get("hn")
                .and_then(Value::as_str)
                .map(|hn| hn.replace('-', "_"))
        });
        let mapping = DiscoveryMapping::default().with_segment_source(SegmentSource::Custom(resolver));
        let record = mapping.decode("x", TASMOTA_PAYLOAD).unwrap();
        assert_eq!(record.topic_segment, "tasmota_ABCDEF_1234");
    }

    #[test]
    fn custom_keys() {
        let mapping = DiscoveryMapping::default()
            .with_address_keys(["hw"])
            .with_name_keys(["label"])
            .with_model_key(None);
        let record = mapping
            .decode("x", br#"{"hw":"01:02","label":"Den","t":"den","md":"X"}"#)
            .unwrap();
        assert_eq!(record.hardware_address.as_str(), "0102");
        assert_eq!(record.display_name, "Den");
        assert!(record.model.is_none());
    }

    #[test]
    fn non_object_is_error() {
        let err = DiscoveryMapping::default().decode("x", b"\"hello\"").unwrap_err();
        assert!(matches!(err, DecodeError::NotAnObject));
    }

    #[test]
    fn debug_hides_custom_resolver() {
        let source = SegmentSource::Custom(Arc::new(|_: &Map<String, Value>, _: &str| None::<String>));
        assert_eq!(format!("{source:?}"), "Custom(..)");
    }
}
