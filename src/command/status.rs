// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Status query commands.
//!
//! Only the device-parameters query is needed: its `STATUS1` reply carries
//! the MAC address of devices seen on telemetry before discovery.

use crate::command::Command;

/// Status type of the device-parameters query.
const DEVICE_PARAMETERS: u8 = 1;

/// Command to query device parameters (`Status 1`).
///
/// # Examples
///
/// ```
/// use mielhvac_bridge::command::{Command, StatusCommand};
///
/// let cmd = StatusCommand::device_parameters();
/// assert_eq!(cmd.name(), "Status");
/// assert_eq!(cmd.payload(), Some("1".to_string()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCommand;

impl StatusCommand {
    /// Query device parameters; the reply lands on `stat/<topic>/STATUS1`.
    #[must_use]
    pub const fn device_parameters() -> Self {
        Self
    }
}

impl Command for StatusCommand {
    fn name(&self) -> String {
        "Status".to_string()
    }

    fn payload(&self) -> Option<String> {
        Some(DEVICE_PARAMETERS.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::TopicScheme;

    #[test]
    fn renders_status_one() {
        let cmd = StatusCommand::device_parameters();
        assert_eq!(cmd.mqtt_topic_suffix(), "Status");
        assert_eq!(cmd.mqtt_payload(), "1");
    }

    #[test]
    fn message_targets_command_topic() {
        let msg = StatusCommand::default()
            .to_message(&TopicScheme::default(), "tasmota_hall")
            .unwrap();
        assert_eq!(msg.topic, "cmnd/tasmota_hall/Status");
        assert_eq!(msg.payload, "1");
    }
}
