// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parser for `tele/<topic>/HVACSETTINGS` messages.
//!
//! Each field is decoded on its own. A field that fails validation is
//! recorded as a [`FieldRejection`] and the other fields are kept.

use std::str::FromStr;

use serde_json::{Map, Value};

use super::parse_object;
use crate::error::{DecodeError, ValidationError};
use crate::types::{FanSpeed, HvacMode, SwingHorizontal, SwingVertical, TargetTemperature};

/// Keys accepted for each field, first match wins.
const MODE_KEYS: &[&str] = &["HAMode", "Mode"];
const TEMP_KEYS: &[&str] = &["Temp"];
const FAN_KEYS: &[&str] = &["FanSpeed", "Fan"];
const SWING_V_KEYS: &[&str] = &["SwingV"];
const SWING_H_KEYS: &[&str] = &["SwingH"];

/// A settings field that was present but could not be used.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRejection {
    /// The payload key that carried the value.
    pub field: String,
    /// The value as received.
    pub value: Value,
    /// Why the value was rejected.
    pub reason: String,
}

/// Decoded settings, every field optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsRecord {
    /// Operating mode.
    pub mode: Option<HvacMode>,
    /// Setpoint.
    pub target_temperature: Option<TargetTemperature>,
    /// Fan speed.
    pub fan_speed: Option<FanSpeed>,
    /// Vertical vane position.
    pub swing_vertical: Option<SwingVertical>,
    /// Horizontal vane position.
    pub swing_horizontal: Option<SwingHorizontal>,
    /// Fields that were present but rejected.
    pub rejections: Vec<FieldRejection>,
}

impl SettingsRecord {
    /// Returns `true` if no field was decoded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mode.is_none()
            && self.target_temperature.is_none()
            && self.fan_speed.is_none()
            && self.swing_vertical.is_none()
            && self.swing_horizontal.is_none()
    }
}

/// Decodes a settings payload with partial success.
///
/// Accepts both the driver's keys (`HAMode`, `FanSpeed`) and the short
/// aliases (`Mode`, `Fan`).
///
/// # Errors
///
/// Returns a `DecodeError` only if the payload is not a JSON object.
/// Invalid fields are reported in [`SettingsRecord::rejections`].
pub fn decode_settings(payload: &[u8]) -> Result<SettingsRecord, DecodeError> {
    let map = parse_object(payload)?;
    let mut record = SettingsRecord::default();
    let rejections = &mut record.rejections;

    record.mode = decode_token(&map, MODE_KEYS, rejections);
    record.fan_speed = decode_token(&map, FAN_KEYS, rejections);
    record.swing_vertical = decode_token(&map, SWING_V_KEYS, rejections);
    record.swing_horizontal = decode_token(&map, SWING_H_KEYS, rejections);
    record.target_temperature = decode_temperature(&map, rejections);

    Ok(record)
}

fn lookup<'a>(map: &'a Map<String, Value>, keys: &[&'static str]) -> Option<(&'static str, &'a Value)> {
    keys.iter()
        .find_map(|&key| map.get(key).map(|value| (key, value)))
}

fn reject(rejections: &mut Vec<FieldRejection>, field: &str, value: &Value, reason: String) {
    rejections.push(FieldRejection {
        field: field.to_string(),
        value: value.clone(),
        reason,
    });
}

fn decode_token<T>(
    map: &Map<String, Value>,
    keys: &[&'static str],
    rejections: &mut Vec<FieldRejection>,
) -> Option<T>
where
    T: FromStr<Err = ValidationError>,
{
    let (field, value) = lookup(map, keys)?;
    let token = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => {
            reject(rejections, field, value, "expected a string token".to_string());
            return None;
        }
    };
    match token.parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            reject(rejections, field, value, e.to_string());
            None
        }
    }
}

fn decode_temperature(
    map: &Map<String, Value>,
    rejections: &mut Vec<FieldRejection>,
) -> Option<TargetTemperature> {
    let (field, value) = lookup(map, TEMP_KEYS)?;
    let celsius = match value {
        Value::Null => return None,
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    let Some(celsius) = celsius else {
        reject(rejections, field, value, "expected a number".to_string());
        return None;
    };
    match TargetTemperature::new(celsius) {
        Ok(t) => Some(t),
        Err(e) => {
            reject(rejections, field, value, e.to_string());
            None
        }
    }
}
