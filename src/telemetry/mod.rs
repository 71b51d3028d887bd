// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Payload decoding for MiElHVAC MQTT messages.
//!
//! This module turns raw payload bytes into typed records. Each recognized
//! topic kind has its own decoder:
//!
//! - `tasmota/discovery/<id>/config` - [`DiscoveryMapping::decode`]
//! - `tele/<topic>/SENSOR` - [`decode_sensor`]
//! - `tele/<topic>/HVACSETTINGS` - [`decode_settings`]
//! - `tele/<topic>/LWT` - [`decode_availability`]
//! - `stat/<topic>/STATUS1` - [`decode_status`]
//!
//! Loosely typed fields are converted to the closed types in
//! [`crate::types`] here; unknown tokens never pass through as strings.
//!
//! # Examples
//!
//! ```
//! use mielhvac_bridge::telemetry::decode_settings;
//! use mielhvac_bridge::types::{FanSpeed, HvacMode};
//!
//! let record = decode_settings(br#"{"HAMode":"heat","Temp":22,"FanSpeed":"turbo"}"#).unwrap();
//! assert_eq!(record.mode, Some(HvacMode::Heat));
//! assert_eq!(record.fan_speed, None);
//! assert_eq!(record.rejections.len(), 1);
//! ```

mod discovery_parser;
mod sensor_parser;
mod settings_parser;
mod status_parser;

pub use discovery_parser::{DiscoveryMapping, DiscoveryRecord, SegmentSource, SegmentResolver};
pub use sensor_parser::{SensorReading, decode_sensor};
pub use settings_parser::{FieldRejection, SettingsRecord, decode_settings};
pub use status_parser::decode_status;

use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::types::Availability;

/// Interprets a payload as UTF-8 text.
///
/// # Errors
///
/// Returns `DecodeError::InvalidUtf8` if the bytes are not valid UTF-8.
pub fn payload_text(payload: &[u8]) -> Result<&str, DecodeError> {
    std::str::from_utf8(payload).map_err(|_| DecodeError::InvalidUtf8)
}

/// Decodes an LWT payload.
///
/// # Errors
///
/// Returns `DecodeError::InvalidUtf8` for non-text payloads and
/// `DecodeError::UnknownToken` for anything other than `Online`/`Offline`.
pub fn decode_availability(payload: &[u8]) -> Result<Availability, DecodeError> {
    payload_text(payload)?.parse()
}

/// Parses a payload as a JSON object.
pub(crate) fn parse_object(payload: &[u8]) -> Result<Map<String, Value>, DecodeError> {
    let text = payload_text(payload)?;
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        _ => Err(DecodeError::NotAnObject),
    }
}

/// Returns the first key in `keys` holding a non-empty string.
pub(crate) fn first_string<'a>(map: &'a Map<String, Value>, keys: &[String]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| map.get(key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
}
