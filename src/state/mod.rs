// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Climate state tracking.
//!
//! [`ClimateState`] holds the canonical state of one heat pump. Every
//! update returns the [`ChangedFields`] it produced so callers can emit
//! minimal change notifications.
//!
//! # Examples
//!
//! ```
//! use mielhvac_bridge::state::{ChangedField, ClimateState};
//! use mielhvac_bridge::telemetry::SensorReading;
//!
//! let mut state = ClimateState::new();
//! let changed = state.apply_sensor(&SensorReading { current_temperature: Some(21.5) });
//!
//! assert!(changed.contains(ChangedField::CurrentTemperature));
//! assert_eq!(state.current_temperature(), Some(21.5));
//! assert!(state.mode().is_none());
//! ```

mod changed_fields;
mod climate_state;

pub use changed_fields::{ChangedField, ChangedFields};
pub use climate_state::ClimateState;
