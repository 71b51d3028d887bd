// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Heat pump control commands.

use std::fmt;

use crate::command::Command;
use crate::error::ValidationError;
use crate::types::{FanSpeed, HvacMode, SwingHorizontal, SwingVertical, TargetTemperature};

/// Which setting an intent targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentKind {
    /// Operating mode.
    Mode,
    /// Setpoint.
    TargetTemperature,
    /// Fan speed.
    FanSpeed,
    /// Vertical vane.
    SwingVertical,
    /// Horizontal vane.
    SwingHorizontal,
}

impl IntentKind {
    /// Returns the driver command name for this kind.
    #[must_use]
    pub const fn command_name(&self) -> &'static str {
        match self {
            Self::Mode => "HVACSetHAMode",
            Self::TargetTemperature => "HVACSetTemp",
            Self::FanSpeed => "HVACSetFanSpeed",
            Self::SwingVertical => "HVACSetSwingV",
            Self::SwingHorizontal => "HVACSetSwingH",
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command_name())
    }
}

/// A high-level request from the entity layer, not yet validated.
///
/// Enum-valued intents are typed already; the setpoint is a raw number
/// until [`HvacIntent::validate`] checks it against the range and grid.
///
/// # Examples
///
/// ```
/// use mielhvac_bridge::command::{HvacIntent, IntentKind};
/// use mielhvac_bridge::types::FanSpeed;
///
/// let intent = HvacIntent::parse(IntentKind::FanSpeed, "quiet").unwrap();
/// assert_eq!(intent, HvacIntent::SetFanSpeed(FanSpeed::Quiet));
///
/// assert!(HvacIntent::SetTargetTemperature(22.3).validate().is_err());
/// assert!(HvacIntent::SetTargetTemperature(22.5).validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HvacIntent {
    /// Change the operating mode.
    SetMode(HvacMode),
    /// Change the setpoint, in °C.
    SetTargetTemperature(f64),
    /// Change the fan speed.
    SetFanSpeed(FanSpeed),
    /// Change the vertical vane position.
    SetSwingVertical(SwingVertical),
    /// Change the horizontal vane position.
    SetSwingHorizontal(SwingHorizontal),
}

impl HvacIntent {
    /// Parses a textual request.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownToken` for tokens outside the
    /// enumeration, or for a setpoint that is not a number. Range and grid
    /// checks happen in [`HvacIntent::validate`].
    pub fn parse(kind: IntentKind, raw: &str) -> Result<Self, ValidationError> {
        Ok(match kind {
            IntentKind::Mode => Self::SetMode(raw.parse()?),
            IntentKind::TargetTemperature => {
                let celsius = raw
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| ValidationError::UnknownToken {
                        kind: "temperature",
                        token: raw.to_string(),
                    })?;
                Self::SetTargetTemperature(celsius)
            }
            IntentKind::FanSpeed => Self::SetFanSpeed(raw.parse()?),
            IntentKind::SwingVertical => Self::SetSwingVertical(raw.parse()?),
            IntentKind::SwingHorizontal => Self::SetSwingHorizontal(raw.parse()?),
        })
    }

    /// Returns the kind of setting this intent targets.
    #[must_use]
    pub const fn kind(&self) -> IntentKind {
        match self {
            Self::SetMode(_) => IntentKind::Mode,
            Self::SetTargetTemperature(_) => IntentKind::TargetTemperature,
            Self::SetFanSpeed(_) => IntentKind::FanSpeed,
            Self::SetSwingVertical(_) => IntentKind::SwingVertical,
            Self::SetSwingHorizontal(_) => IntentKind::SwingHorizontal,
        }
    }

    /// Validates the intent into a command.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the setpoint is not finite, outside
    /// `[10.0, 31.0]` or off the 0.5 grid. It is never clamped.
    pub fn validate(self) -> Result<HvacCommand, ValidationError> {
        Ok(match self {
            Self::SetMode(mode) => HvacCommand::SetMode(mode),
            Self::SetTargetTemperature(celsius) => {
                HvacCommand::SetTargetTemperature(TargetTemperature::new(celsius)?)
            }
            Self::SetFanSpeed(speed) => HvacCommand::SetFanSpeed(speed),
            Self::SetSwingVertical(pos) => HvacCommand::SetSwingVertical(pos),
            Self::SetSwingHorizontal(pos) => HvacCommand::SetSwingHorizontal(pos),
        })
    }
}

/// A validated heat pump command.
///
/// # Examples
///
/// ```
/// use mielhvac_bridge::command::{Command, HvacCommand};
/// use mielhvac_bridge::types::{HvacMode, TargetTemperature};
///
/// let cmd = HvacCommand::SetMode(HvacMode::FanOnly);
/// assert_eq!(cmd.name(), "HVACSetHAMode");
/// assert_eq!(cmd.payload(), Some("fan_only".to_string()));
///
/// let cmd = HvacCommand::SetTargetTemperature(TargetTemperature::new(22.5).unwrap());
/// assert_eq!(cmd.payload(), Some("22.5".to_string()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HvacCommand {
    /// Set the operating mode.
    SetMode(HvacMode),
    /// Set the setpoint.
    SetTargetTemperature(TargetTemperature),
    /// Set the fan speed.
    SetFanSpeed(FanSpeed),
    /// Set the vertical vane position.
    SetSwingVertical(SwingVertical),
    /// Set the horizontal vane position.
    SetSwingHorizontal(SwingHorizontal),
}

impl HvacCommand {
    /// Returns the kind of setting this command targets.
    #[must_use]
    pub const fn kind(&self) -> IntentKind {
        match self {
            Self::SetMode(_) => IntentKind::Mode,
            Self::SetTargetTemperature(_) => IntentKind::TargetTemperature,
            Self::SetFanSpeed(_) => IntentKind::FanSpeed,
            Self::SetSwingVertical(_) => IntentKind::SwingVertical,
            Self::SetSwingHorizontal(_) => IntentKind::SwingHorizontal,
        }
    }
}

impl Command for HvacCommand {
    fn name(&self) -> String {
        self.kind().command_name().to_string()
    }

    fn payload(&self) -> Option<String> {
        Some(match self {
            Self::SetMode(mode) => mode.as_str().to_string(),
            Self::SetTargetTemperature(t) => t.to_string(),
            Self::SetFanSpeed(speed) => speed.as_str().to_string(),
            Self::SetSwingVertical(pos) => pos.as_str().to_string(),
            Self::SetSwingHorizontal(pos) => pos.as_str().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Parsing ==========

    #[test]
    fn parse_each_kind() {
        assert_eq!(
            HvacIntent::parse(IntentKind::Mode, "cool").unwrap(),
            HvacIntent::SetMode(HvacMode::Cool)
        );
        assert_eq!(
            HvacIntent::parse(IntentKind::TargetTemperature, "21.5").unwrap(),
            HvacIntent::SetTargetTemperature(21.5)
        );
        assert_eq!(
            HvacIntent::parse(IntentKind::SwingVertical, "down_middle").unwrap(),
            HvacIntent::SetSwingVertical(SwingVertical::DownMiddle)
        );
        assert_eq!(
            HvacIntent::parse(IntentKind::SwingHorizontal, "right").unwrap(),
            HvacIntent::SetSwingHorizontal(SwingHorizontal::Right)
        );
    }

    #[test]
    fn parse_rejects_unknown_tokens() {
        assert!(matches!(
            HvacIntent::parse(IntentKind::Mode, "heat_cool"),
            Err(ValidationError::UnknownToken { kind: "mode", .. })
        ));
        assert!(matches!(
            HvacIntent::parse(IntentKind::TargetTemperature, "warm"),
            Err(ValidationError::UnknownToken { kind: "temperature", .. })
        ));
        assert!(HvacIntent::parse(IntentKind::FanSpeed, "5").is_err());
    }

    #[test]
    fn kind_matches_variant() {
        let intent = HvacIntent::SetSwingHorizontal(SwingHorizontal::Split);
        assert_eq!(intent.kind(), IntentKind::SwingHorizontal);
        assert_eq!(intent.validate().unwrap().kind(), IntentKind::SwingHorizontal);
    }

    // ========== Validation ==========

    #[test]
    fn temperature_validation() {
        assert!(HvacIntent::SetTargetTemperature(10.0).validate().is_ok());
        assert!(HvacIntent::SetTargetTemperature(31.0).validate().is_ok());
        assert!(HvacIntent::SetTargetTemperature(22.3).validate().is_err());
        assert!(HvacIntent::SetTargetTemperature(9.5).validate().is_err());
        assert!(HvacIntent::SetTargetTemperature(f64::NAN).validate().is_err());
    }

    // ========== Encoding ==========

    #[test]
    fn command_names() {
        assert_eq!(HvacCommand::SetMode(HvacMode::Off).name(), "HVACSetHAMode");
        assert_eq!(
            HvacCommand::SetTargetTemperature(TargetTemperature::MIN).name(),
            "HVACSetTemp"
        );
        assert_eq!(HvacCommand::SetFanSpeed(FanSpeed::Auto).name(), "HVACSetFanSpeed");
        assert_eq!(
            HvacCommand::SetSwingVertical(SwingVertical::Auto).name(),
            "HVACSetSwingV"
        );
        assert_eq!(
            HvacCommand::SetSwingHorizontal(SwingHorizontal::Auto).name(),
            "HVACSetSwingH"
        );
    }

    #[test]
    fn payload_tokens() {
        assert_eq!(
            HvacCommand::SetSwingVertical(SwingVertical::UpMiddle).mqtt_payload(),
            "up_middle"
        );
        assert_eq!(HvacCommand::SetFanSpeed(FanSpeed::Speed3).mqtt_payload(), "3");
        let whole = HvacIntent::SetTargetTemperature(22.0).validate().unwrap();
        assert_eq!(whole.mqtt_payload(), "22");
        let half = HvacIntent::SetTargetTemperature(22.5).validate().unwrap();
        assert_eq!(half.mqtt_payload(), "22.5");
    }
}
