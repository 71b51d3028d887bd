// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Operating mode of the heat pump.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Operating mode as reported in `HAMode` and accepted by `HVACSetHAMode`.
///
/// # Examples
///
/// ```
/// use mielhvac_bridge::types::HvacMode;
///
/// let mode: HvacMode = "fan_only".parse().unwrap();
/// assert_eq!(mode, HvacMode::FanOnly);
/// assert_eq!(mode.as_str(), "fan_only");
/// assert!("turbo".parse::<HvacMode>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HvacMode {
    /// Unit is switched off.
    Off,
    /// Unit chooses between heating and cooling.
    Auto,
    /// Cooling.
    Cool,
    /// Dehumidifying.
    Dry,
    /// Heating.
    Heat,
    /// Fan only, no compressor.
    FanOnly,
}

impl HvacMode {
    /// All modes, in the order the platform lists them.
    pub const ALL: [Self; 6] = [
        Self::Off,
        Self::Auto,
        Self::Cool,
        Self::Dry,
        Self::Heat,
        Self::FanOnly,
    ];

    /// Returns the protocol token.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Auto => "auto",
            Self::Cool => "cool",
            Self::Dry => "dry",
            Self::Heat => "heat",
            Self::FanOnly => "fan_only",
        }
    }

    /// Returns the action the unit is expected to perform in this mode.
    #[must_use]
    pub const fn action(&self) -> HvacAction {
        match self {
            Self::Off => HvacAction::Off,
            Self::Auto => HvacAction::Idle,
            Self::Cool => HvacAction::Cooling,
            Self::Dry => HvacAction::Drying,
            Self::Heat => HvacAction::Heating,
            Self::FanOnly => HvacAction::Fan,
        }
    }
}

impl fmt::Display for HvacMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HvacMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "auto" => Ok(Self::Auto),
            "cool" => Ok(Self::Cool),
            "dry" => Ok(Self::Dry),
            "heat" => Ok(Self::Heat),
            "fan_only" => Ok(Self::FanOnly),
            _ => Err(ValidationError::UnknownToken {
                kind: "mode",
                token: s.to_string(),
            }),
        }
    }
}

/// What the unit is currently doing, derived from its mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HvacAction {
    /// Not running.
    Off,
    /// Running but neither heating nor cooling.
    Idle,
    /// Cooling.
    Cooling,
    /// Dehumidifying.
    Drying,
    /// Heating.
    Heating,
    /// Moving air only.
    Fan,
}
