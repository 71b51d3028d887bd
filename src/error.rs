// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the bridge.
//!
//! Errors are split by where they originate: inbound payload decoding,
//! outbound intent validation, and delivery to the bus. Decode errors are
//! local to one message and never escape the inbound path; validation and
//! delivery errors are returned to whoever submitted the intent.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// An inbound payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// An outbound intent was rejected before reaching the bus.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The bus reported a publish failure.
    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// No device is known under the requested topic segment.
    #[error("device not found")]
    DeviceNotFound,
}

/// Errors raised while decoding an inbound payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A text payload was not valid UTF-8.
    #[error("payload is not valid UTF-8")]
    InvalidUtf8,

    /// The payload parsed, but is not a JSON object.
    #[error("payload is not a JSON object")]
    NotAnObject,

    /// A required field is missing from the payload.
    #[error("missing field in payload: {0}")]
    MissingField(String),

    /// A field is present but its value could not be used.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },

    /// A field carried a token outside its enumeration.
    #[error("unrecognized {field} token: {token}")]
    UnknownToken {
        /// The field that carried the token.
        field: String,
        /// The token as received.
        token: String,
    },
}

/// Errors raised while validating an outbound intent.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Target temperature outside the supported band.
    #[error("temperature {value} is out of range [{min}, {max}]")]
    TemperatureOutOfRange {
        /// Lowest accepted value in °C.
        min: f64,
        /// Highest accepted value in °C.
        max: f64,
        /// The value that was requested.
        value: f64,
    },

    /// Target temperature not aligned to the 0.5 °C grid.
    #[error("temperature {0} is not a multiple of 0.5")]
    TemperatureOffGrid(f64),

    /// Target temperature is NaN or infinite.
    #[error("temperature is not a finite number")]
    NotFinite,

    /// A textual request named a value outside the enumeration.
    #[error("unrecognized {kind} value: {token}")]
    UnknownToken {
        /// Which setting the token was meant for.
        kind: &'static str,
        /// The token as received.
        token: String,
    },

    /// The topic segment cannot be used to build a topic.
    #[error("invalid topic segment: {0:?}")]
    InvalidSegment(String),
}

/// Errors reported by the bus when publishing.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The MQTT client rejected the publish request.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Connection to the broker failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Invalid broker address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Internal channel was closed.
    #[error("channel closed: {0}")]
    ChannelClosed(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
