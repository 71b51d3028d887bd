// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lifecycle events for the entity layer.
//!
//! The bridge reports what happened to a device through [`LifecycleEvent`]s
//! broadcast on an [`EventBus`]. The same events are also returned from
//! `Bridge::handle_message`.
//!
//! # Examples
//!
//! ```
//! use mielhvac_bridge::event::{EventBus, LifecycleEvent};
//! use mielhvac_bridge::registry::Device;
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(LifecycleEvent::unavailable(Device::new("tasmota_1").snapshot()));
//! assert!(rx.try_recv().unwrap().is_unavailable());
//! ```

mod event_bus;
mod lifecycle_event;

pub use event_bus::{DEFAULT_EVENT_CAPACITY, EventBus};
pub use lifecycle_event::LifecycleEvent;
