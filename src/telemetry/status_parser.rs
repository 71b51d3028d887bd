// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parser for `stat/<topic>/STATUS1` replies.

use serde_json::Value;

use super::parse_object;
use crate::error::DecodeError;
use crate::types::HardwareAddress;

/// Extracts the hardware address from a status reply.
///
/// Looks in `StatusNET.Mac` first, then a top-level `Mac`. A reply without
/// either yields `Ok(None)`.
///
/// # Errors
///
/// Returns a `DecodeError` if the payload is not a JSON object or the
/// address is malformed.
///
/// # Examples
///
/// ```
/// use mielhvac_bridge::telemetry::decode_status;
///
/// let mac = decode_status(br#"{"StatusNET":{"Mac":"A4:CF:12:AB:CD:EF"}}"#).unwrap();
/// assert_eq!(mac.unwrap().as_str(), "A4CF12ABCDEF");
/// ```
pub fn decode_status(payload: &[u8]) -> Result<Option<HardwareAddress>, DecodeError> {
    let map = parse_object(payload)?;
    let mac = map
        .get("StatusNET")
        .and_then(|net| net.get("Mac"))
        .and_then(Value::as_str)
        .or_else(|| map.get("Mac").and_then(Value::as_str))
        .filter(|s| !s.trim().is_empty());
    mac.map(HardwareAddress::new).transpose()
}
