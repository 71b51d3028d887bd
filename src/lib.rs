// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `MiElHVAC` Bridge - discovery correlation and climate state sync for
//! Mitsubishi heat pumps running the Tasmota `MiElHVAC` driver.
//!
//! Tasmota announces devices on a discovery topic and reports their
//! telemetry on per-device topics, independently and in no particular
//! order. This library merges both streams into one device identity,
//! decodes the driver's payloads into a strongly typed climate state and
//! turns control intents into validated command messages.
//!
//! # Supported Features
//!
//! - **Correlation**: discovery and telemetry merged by topic segment, with
//!   the MAC address as the durable key (re-keying on topic changes)
//! - **State tracking**: mode, setpoint, room temperature, fan and vanes,
//!   with minimal change sets
//! - **Availability**: LWT, optional staleness window, transport loss
//! - **Commands**: `HVACSetHAMode`, `HVACSetTemp` (0.5 °C grid, 10-31 °C),
//!   `HVACSetFanSpeed`, `HVACSetSwingV`, `HVACSetSwingH`
//! - **MAC fallback**: `Status 1` query for devices seen before discovery
//!
//! # Quick Start
//!
//! ## Feeding messages yourself
//!
//! ```
//! use mielhvac_bridge::{Bridge, HvacIntent};
//!
//! let bridge = Bridge::default();
//!
//! bridge.handle_message(
//!     "tasmota/discovery/AABBCCDDEEFF/config",
//!     br#"{"mac":"AABBCCDDEEFF","dn":"Living Room","t":"tasmota_1"}"#,
//! );
//! let outcome = bridge.handle_message(
//!     "tele/tasmota_1/HVACSETTINGS",
//!     br#"{"HAMode":"heat","Temp":22,"FanSpeed":"auto"}"#,
//! );
//! assert!(outcome.events[0].is_linkable());
//!
//! let message = bridge
//!     .prepare_intent("tasmota_1", HvacIntent::SetTargetTemperature(22.5))
//!     .unwrap();
//! assert_eq!(message.topic, "cmnd/tasmota_1/HVACSetTemp");
//! assert_eq!(message.payload, "22.5");
//! ```
//!
//! ## Connecting to a broker
//!
//! ```no_run
//! use mielhvac_bridge::MqttBridge;
//!
//! #[tokio::main]
//! async fn main() -> mielhvac_bridge::Result<()> {
//!     let mqtt = MqttBridge::builder()
//!         .host("192.168.1.50")
//!         .credentials("user", "password")
//!         .build()
//!         .await?;
//!
//!     let mut events = mqtt.subscribe();
//!     while let Ok(event) = events.recv().await {
//!         println!("{}: {event:?}", event.topic_segment());
//!     }
//!     Ok(())
//! }
//! ```

pub mod command;
pub mod error;
pub mod event;
pub mod manager;
pub mod protocol;
pub mod registry;
pub mod state;
pub mod telemetry;
pub mod types;

pub use command::{Command, HvacCommand, HvacIntent, IntentKind, OutboundMessage, build_command};
pub use error::{DecodeError, DeliveryError, Error, Result, ValidationError};
pub use event::{EventBus, LifecycleEvent};
pub use manager::{Bridge, BridgeConfig, MessageOutcome};
#[cfg(feature = "mqtt")]
pub use protocol::{MqttBridge, MqttBridgeBuilder};
pub use protocol::{CommandSink, TopicKind, TopicScheme};
pub use registry::{DeviceIdentity, DeviceSnapshot};
pub use state::{ChangedField, ChangedFields, ClimateState};
pub use types::{
    Availability, FanSpeed, HardwareAddress, HvacAction, HvacMode, SwingHorizontal, SwingVertical,
    TargetTemperature,
};
