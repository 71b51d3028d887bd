// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outbound command definitions.
//!
//! This module turns control intents into MQTT messages addressed to the
//! MiElHVAC driver on a Tasmota device.
//!
//! # Available Commands
//!
//! | Command | Topic suffix | Payload |
//! |---------|--------------|---------|
//! | [`HvacCommand::SetMode`] | `HVACSetHAMode` | `off`, `auto`, `cool`, `dry`, `heat`, `fan_only` |
//! | [`HvacCommand::SetTargetTemperature`] | `HVACSetTemp` | `22`, `22.5` |
//! | [`HvacCommand::SetFanSpeed`] | `HVACSetFanSpeed` | `auto`, `quiet`, `1`-`4` |
//! | [`HvacCommand::SetSwingVertical`] | `HVACSetSwingV` | `auto`, `up`, ..., `swing` |
//! | [`HvacCommand::SetSwingHorizontal`] | `HVACSetSwingH` | `auto`, `left`, ..., `swing` |
//! | [`StatusCommand`] | `Status` | `1` |
//!
//! # Examples
//!
//! ```
//! use mielhvac_bridge::command::{build_command, HvacIntent};
//! use mielhvac_bridge::protocol::TopicScheme;
//! use mielhvac_bridge::types::HvacMode;
//!
//! let scheme = TopicScheme::default();
//! let msg = build_command(&scheme, "tasmota_hall", HvacIntent::SetMode(HvacMode::Heat)).unwrap();
//!
//! assert_eq!(msg.topic, "cmnd/tasmota_hall/HVACSetHAMode");
//! assert_eq!(msg.payload, "heat");
//! ```

mod hvac;
mod status;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::protocol::TopicScheme;

pub use hvac::{HvacCommand, HvacIntent, IntentKind};
pub use status::StatusCommand;

/// A command that can be sent to a Tasmota device.
pub trait Command {
    /// Returns the command name, e.g. `"HVACSetTemp"` or `"Status"`.
    fn name(&self) -> String;

    /// Returns the command payload, if any.
    fn payload(&self) -> Option<String>;

    /// Returns the MQTT topic suffix for this command.
    ///
    /// This is the part after `cmnd/<topic>/`.
    fn mqtt_topic_suffix(&self) -> String {
        self.name()
    }

    /// Returns the MQTT payload for this command.
    ///
    /// Returns empty string for query commands.
    fn mqtt_payload(&self) -> String {
        self.payload().unwrap_or_default()
    }

    /// Renders the command as a message for the device at `segment`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidSegment` if `segment` cannot be
    /// used in a topic.
    fn to_message(
        &self,
        scheme: &TopicScheme,
        segment: &str,
    ) -> Result<OutboundMessage, ValidationError> {
        Ok(OutboundMessage {
            topic: scheme.command_topic(segment, &self.mqtt_topic_suffix())?,
            payload: self.mqtt_payload(),
        })
    }
}

/// A message ready to publish on the bus.
///
/// Commands are published at QoS 1 without the retain flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Full topic, e.g. `cmnd/tasmota_hall/HVACSetTemp`.
    pub topic: String,
    /// UTF-8 payload.
    pub payload: String,
}

impl OutboundMessage {
    /// Creates a message.
    #[must_use]
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Validates `intent` and renders it for the device at `segment`.
///
/// Pure: nothing is published and no state is touched.
///
/// # Errors
///
/// Returns a `ValidationError` if the intent is invalid or the segment
/// cannot be used in a topic.
pub fn build_command(
    scheme: &TopicScheme,
    segment: &str,
    intent: HvacIntent,
) -> Result<OutboundMessage, ValidationError> {
    intent.validate()?.to_message(scheme, segment)
}
