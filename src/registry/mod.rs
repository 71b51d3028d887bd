// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device records and discovery correlation.
//!
//! A [`Device`] owns one [`DeviceIdentity`] and one climate state. The
//! [`DeviceRegistry`] keys devices by topic segment and merges discovery
//! announcements with telemetry as each arrives, in any order.

mod device;
mod device_registry;

pub use device::{Device, DeviceIdentity, DeviceSnapshot};
pub use device_registry::{Correlation, DeviceHandle, DeviceRegistry, DiscoveryOutcome};
