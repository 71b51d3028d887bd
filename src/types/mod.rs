// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for heat pump state and commands.
//!
//! Every loosely-typed token the firmware publishes is converted to one of
//! these closed types at the decode boundary. Each type guarantees its
//! invariant at construction time.
//!
//! # Types
//!
//! - [`HvacMode`] - Operating mode (off, auto, cool, dry, heat, `fan_only`)
//! - [`HvacAction`] - Action derived from the mode
//! - [`FanSpeed`] - Fan speed (auto, quiet, 1-4)
//! - [`SwingVertical`] / [`SwingHorizontal`] - Vane positions
//! - [`TargetTemperature`] - Setpoint (10-31 °C, 0.5 °C step)
//! - [`Availability`] - LWT token (Online/Offline)
//! - [`HardwareAddress`] - Normalized MAC address

mod availability;
mod fan_speed;
mod hardware_address;
mod hvac_mode;
mod swing;
mod temperature;

pub use availability::Availability;
pub use fan_speed::FanSpeed;
pub use hardware_address::HardwareAddress;
pub use hvac_mode::{HvacAction, HvacMode};
pub use swing::{SwingHorizontal, SwingVertical};
pub use temperature::TargetTemperature;
