// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fan speed setting.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Indoor unit fan speed.
///
/// The driver reports and accepts `auto`, `quiet` and the numeric steps
/// `1` to `4`.
///
/// # Examples
///
/// ```
/// use mielhvac_bridge::types::FanSpeed;
///
/// assert_eq!("3".parse::<FanSpeed>().unwrap(), FanSpeed::Speed3);
/// assert_eq!(FanSpeed::Quiet.as_str(), "quiet");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FanSpeed {
    /// Unit picks the speed.
    #[serde(rename = "auto")]
    Auto,
    /// Lowest noise setting.
    #[serde(rename = "quiet")]
    Quiet,
    /// Step 1.
    #[serde(rename = "1")]
    Speed1,
    /// Step 2.
    #[serde(rename = "2")]
    Speed2,
    /// Step 3.
    #[serde(rename = "3")]
    Speed3,
    /// Step 4.
    #[serde(rename = "4")]
    Speed4,
}

impl FanSpeed {
    /// All fan speeds, in the order the platform lists them.
    pub const ALL: [Self; 6] = [
        Self::Auto,
        Self::Quiet,
        Self::Speed1,
        Self::Speed2,
        Self::Speed3,
        Self::Speed4,
    ];

    /// Returns the protocol token.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Quiet => "quiet",
            Self::Speed1 => "1",
            Self::Speed2 => "2",
            Self::Speed3 => "3",
            Self::Speed4 => "4",
        }
    }
}

impl fmt::Display for FanSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FanSpeed {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "quiet" => Ok(Self::Quiet),
            "1" => Ok(Self::Speed1),
            "2" => Ok(Self::Speed2),
            "3" => Ok(Self::Speed3),
            "4" => Ok(Self::Speed4),
            _ => Err(ValidationError::UnknownToken {
                kind: "fan speed",
                token: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_token() {
        for speed in FanSpeed::ALL {
            assert_eq!(speed.as_str().parse::<FanSpeed>().unwrap(), speed);
        }
    }

    #[test]
    fn rejects_out_of_range_step() {
        assert!("0".parse::<FanSpeed>().is_err());
        assert!("5".parse::<FanSpeed>().is_err());
        assert!("turbo".parse::<FanSpeed>().is_err());
    }

    #[test]
    fn serde_uses_protocol_tokens() {
        assert_eq!(serde_json::to_string(&FanSpeed::Speed2).unwrap(), "\"2\"");
        let parsed: FanSpeed = serde_json::from_str("\"quiet\"").unwrap();
        assert_eq!(parsed, FanSpeed::Quiet);
    }
}
