// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The bridge engine and its lifecycle decisions.
//!
//! [`Bridge`] is the entry point: it owns the device registry, routes every
//! inbound message through decoding, correlation and state merging, and
//! asks the [`LifecycleManager`] which events to emit.
//!
//! # Examples
//!
//! ```
//! use mielhvac_bridge::manager::{Bridge, BridgeConfig};
//!
//! let bridge = Bridge::new(BridgeConfig::default().with_status_requests(false));
//! let mut events = bridge.subscribe();
//!
//! bridge.handle_message(
//!     "tasmota/discovery/AABBCCDDEEFF/config",
//!     br#"{"mac":"AABBCCDDEEFF","dn":"Office","t":"tasmota_office"}"#,
//! );
//! bridge.handle_message("tele/tasmota_office/HVACSETTINGS", br#"{"HAMode":"cool","Temp":24}"#);
//!
//! let event = events.try_recv().unwrap();
//! assert!(event.is_linkable());
//! assert_eq!(event.snapshot().name(), "Office");
//! ```

mod bridge;
mod config;
mod lifecycle;

pub use bridge::{Bridge, MessageOutcome};
pub use config::{BridgeConfig, DEFAULT_MODEL_KEY};
pub use lifecycle::LifecycleManager;
