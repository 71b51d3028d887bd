// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parser for `tele/<topic>/SENSOR` messages.
//!
//! The driver nests its reading under the model key:
//!
//! ```json
//! {"Time":"2024-01-01T12:00:00","MiElHVAC":{"Temperature":21.5}}
//! ```

use serde_json::Value;

use super::parse_object;
use crate::error::DecodeError;

/// Field holding the room temperature inside the model object.
const TEMPERATURE_FIELD: &str = "Temperature";

/// Reading extracted from a SENSOR payload.
///
/// A payload without the model key or without a temperature is not an
/// error; it yields a reading with nothing to apply.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorReading {
    /// Room temperature in °C.
    pub current_temperature: Option<f32>,
}

impl SensorReading {
    /// Returns `true` if the reading carries no value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current_temperature.is_none()
    }
}

/// Decodes a SENSOR payload.
///
/// `model_key` names the object holding the reading (default `MiElHVAC`).
/// Numeric strings are accepted.
///
/// # Errors
///
/// Returns a `DecodeError` if the payload is not a JSON object or the
/// temperature is present but not a finite number.
///
/// # Examples
///
/// ```
/// use mielhvac_bridge::telemetry::decode_sensor;
///
/// let reading = decode_sensor(br#"{"MiElHVAC":{"Temperature":21.5}}"#, "MiElHVAC").unwrap();
/// assert_eq!(reading.current_temperature, Some(21.5));
///
/// let reading = decode_sensor(br#"{"ENERGY":{"Power":5}}"#, "MiElHVAC").unwrap();
/// assert!(reading.is_empty());
/// ```
pub fn decode_sensor(payload: &[u8], model_key: &str) -> Result<SensorReading, DecodeError> {
    let map = parse_object(payload)?;

    let Some(value) = map
        .get(model_key)
        .and_then(Value::as_object)
        .and_then(|model| model.get(TEMPERATURE_FIELD))
    else {
        return Ok(SensorReading::default());
    };

    let current_temperature = match value {
        Value::Null => None,
        Value::Number(n) => n.as_f64().map(narrow).transpose()?,
        Value::String(s) => Some(
            s.trim()
                .parse::<f64>()
                .map_err(|e| invalid(e.to_string()))
                .and_then(narrow)?,
        ),
        other => return Err(invalid(format!("expected a number, got {other}"))),
    };

    Ok(SensorReading {
        current_temperature,
    })
}

#[allow(clippy::cast_possible_truncation)]
fn narrow(value: f64) -> Result<f32, DecodeError> {
    if value.is_finite() {
        Ok(value as f32)
    } else {
        Err(invalid(format!("{value} is not a finite number")))
    }
}

fn invalid(message: String) -> DecodeError {
    DecodeError::InvalidValue {
        field: TEMPERATURE_FIELD.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_temperature() {
        let reading =
            decode_sensor(br#"{"Time":"x","MiElHVAC":{"Temperature":21.5}}"#, "MiElHVAC").unwrap();
        assert_eq!(reading.current_temperature, Some(21.5));
    }

    #[test]
    fn integer_temperature() {
        let reading = decode_sensor(br#"{"MiElHVAC":{"Temperature":20}}"#, "MiElHVAC").unwrap();
        assert_eq!(reading.current_temperature, Some(20.0));
    }

    #[test]
    fn string_temperature() {
        let reading =
            decode_sensor(br#"{"MiElHVAC":{"Temperature":" 19.5 "}}"#, "MiElHVAC").unwrap();
        assert_eq!(reading.current_temperature, Some(19.5));
    }

    #[test]
    fn zero_is_a_reading() {
        let reading = decode_sensor(br#"{"MiElHVAC":{"Temperature":0}}"#, "MiElHVAC").unwrap();
        assert_eq!(reading.current_temperature, Some(0.0));
    }

    #[test]
    fn absent_field_is_no_update() {
        assert!(decode_sensor(br#"{"MiElHVAC":{}}"#, "MiElHVAC").unwrap().is_empty());
        assert!(decode_sensor(br#"{"Other":{"Temperature":1}}"#, "MiElHVAC").unwrap().is_empty());
        assert!(decode_sensor(br#"{"MiElHVAC":{"Temperature":null}}"#, "MiElHVAC").unwrap().is_empty());
    }

    #[test]
    fn custom_model_key() {
        let reading = decode_sensor(br#"{"HVAC":{"Temperature":18}}"#, "HVAC").unwrap();
        assert_eq!(reading.current_temperature, Some(18.0));
    }

    #[test]
    fn non_numeric_is_error() {
        let err = decode_sensor(br#"{"MiElHVAC":{"Temperature":"warm"}}"#, "MiElHVAC").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidValue { .. }));

        let err = decode_sensor(br#"{"MiElHVAC":{"Temperature":true}}"#, "MiElHVAC").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidValue { .. }));

        assert!(decode_sensor(br#"{"MiElHVAC":{"Temperature":"NaN"}}"#, "MiElHVAC").is_err());
    }

    #[test]
    fn malformed_json_is_error() {
        assert!(matches!(
            decode_sensor(b"{not json", "MiElHVAC"),
            Err(DecodeError::Json(_))
        ));
    }
}
