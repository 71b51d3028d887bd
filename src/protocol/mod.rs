// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topic grammar and bus plumbing.
//!
//! - [`TopicScheme`]: classifies inbound topics and renders outbound ones
//! - [`CommandSink`]: anything that can publish an [`OutboundMessage`]
//! - `MqttBridge` (feature `mqtt`): a broker connection driving a
//!   [`Bridge`](crate::manager::Bridge)

#[cfg(feature = "mqtt")]
mod mqtt_bridge;
mod topic;

#[cfg(feature = "mqtt")]
pub use mqtt_bridge::{MqttBridge, MqttBridgeBuilder};
pub use topic::{
    LWT_SUBTOPIC, SENSOR_SUBTOPIC, SETTINGS_SUBTOPIC, STATUS_SUBTOPIC, TopicKind, TopicScheme,
    validate_segment,
};

use crate::command::OutboundMessage;
use crate::error::DeliveryError;

/// Publishes outbound messages on the bus.
///
/// Delivery is fire-and-forget: success means the client accepted the
/// message, not that the device acted on it. The device echoes its new
/// state on the next `HVACSETTINGS` message.
#[allow(async_fn_in_trait)]
pub trait CommandSink {
    /// Publishes `message` at QoS 1 without the retain flag.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError` if the client rejects the message.
    async fn publish(&self, message: &OutboundMessage) -> Result<(), DeliveryError>;
}
