// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Target temperature type.
//!
//! This module provides a type-safe representation of the setpoint,
//! ensuring values are always within 10-31 °C on the 0.5 °C grid.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// Target temperature in °C, stored as a count of half degrees.
///
/// Values outside `[10.0, 31.0]` or not a multiple of 0.5 are rejected;
/// they are never clamped.
///
/// # Examples
///
/// ```
/// use mielhvac_bridge::types::TargetTemperature;
///
/// let t = TargetTemperature::new(22.5).unwrap();
/// assert_eq!(t.celsius(), 22.5);
/// assert_eq!(t.to_string(), "22.5");
///
/// assert_eq!(TargetTemperature::new(22.0).unwrap().to_string(), "22");
///
/// // Off the grid
/// assert!(TargetTemperature::new(22.3).is_err());
/// // Out of range
/// assert!(TargetTemperature::new(9.5).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetTemperature(u8);

impl TargetTemperature {
    /// Lowest accepted setpoint in °C.
    pub const MIN_CELSIUS: f64 = 10.0;

    /// Highest accepted setpoint in °C.
    pub const MAX_CELSIUS: f64 = 31.0;

    /// Setpoint granularity in °C.
    pub const STEP_CELSIUS: f64 = 0.5;

    /// Lowest setpoint.
    pub const MIN: Self = Self(20);

    /// Highest setpoint.
    pub const MAX: Self = Self(62);

    /// Creates a target temperature.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NotFinite` for NaN or infinite values,
    /// `ValidationError::TemperatureOutOfRange` outside `[10.0, 31.0]`, and
    /// `ValidationError::TemperatureOffGrid` when the value is not a multiple
    /// of 0.5.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::float_cmp
    )]
    pub fn new(celsius: f64) -> Result<Self, ValidationError> {
        if !celsius.is_finite() {
            return Err(ValidationError::NotFinite);
        }
        if !(Self::MIN_CELSIUS..=Self::MAX_CELSIUS).contains(&celsius) {
            return Err(ValidationError::TemperatureOutOfRange {
                min: Self::MIN_CELSIUS,
                max: Self::MAX_CELSIUS,
                value: celsius,
            });
        }
        // Doubling is exact, so any fraction left means off the grid.
        let halves = celsius * 2.0;
        if halves.fract() != 0.0 {
            return Err(ValidationError::TemperatureOffGrid(celsius));
        }
        // Range check above bounds `halves` to 20..=62.
        Ok(Self(halves as u8))
    }

    /// Returns the setpoint in °C.
    #[must_use]
    pub fn celsius(&self) -> f64 {
        f64::from(self.0) / 2.0
    }

    /// Returns the setpoint as a count of half degrees.
    #[must_use]
    pub const fn half_degrees(&self) -> u8 {
        self.0
    }

    /// Returns `true` if the setpoint is a whole degree.
    #[must_use]
    pub const fn is_whole(&self) -> bool {
        self.0 % 2 == 0
    }
}

impl fmt::Display for TargetTemperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 2;
        if self.is_whole() {
            write!(f, "{whole}")
        } else {
            write!(f, "{whole}.5")
        }
    }
}

impl TryFrom<f64> for TargetTemperature {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TargetTemperature> for f64 {
    fn from(value: TargetTemperature) -> Self {
        value.celsius()
    }
}

impl Serialize for TargetTemperature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.celsius())
    }
}

impl<'de> Deserialize<'de> for TargetTemperature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}
