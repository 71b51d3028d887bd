// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vane (swing) positions.
//!
//! The vertical and horizontal vanes have different position sets, so they
//! are separate types even though several tokens overlap.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Vertical vane position (`SwingV`).
///
/// # Examples
///
/// ```
/// use mielhvac_bridge::types::SwingVertical;
///
/// let pos: SwingVertical = "up_middle".parse().unwrap();
/// assert_eq!(pos, SwingVertical::UpMiddle);
/// assert!("left".parse::<SwingVertical>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwingVertical {
    /// Unit picks the position.
    Auto,
    /// Topmost position.
    Up,
    /// Between up and center.
    UpMiddle,
    /// Center.
    Center,
    /// Between center and down.
    DownMiddle,
    /// Lowest position.
    Down,
    /// Continuous sweep.
    Swing,
}

impl SwingVertical {
    /// All positions, top to bottom.
    pub const ALL: [Self; 7] = [
        Self::Auto,
        Self::Up,
        Self::UpMiddle,
        Self::Center,
        Self::DownMiddle,
        Self::Down,
        Self::Swing,
    ];

    /// Returns the protocol token.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Up => "up",
            Self::UpMiddle => "up_middle",
            Self::Center => "center",
            Self::DownMiddle => "down_middle",
            Self::Down => "down",
            Self::Swing => "swing",
        }
    }
}

impl fmt::Display for SwingVertical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwingVertical {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "up" => Ok(Self::Up),
            "up_middle" => Ok(Self::UpMiddle),
            "center" => Ok(Self::Center),
            "down_middle" => Ok(Self::DownMiddle),
            "down" => Ok(Self::Down),
            "swing" => Ok(Self::Swing),
            _ => Err(ValidationError::UnknownToken {
                kind: "vertical swing",
                token: s.to_string(),
            }),
        }
    }
}

/// Horizontal vane position (`SwingH`).
///
/// # Examples
///
/// ```
/// use mielhvac_bridge::types::SwingHorizontal;
///
/// assert_eq!("split".parse::<SwingHorizontal>().unwrap(), SwingHorizontal::Split);
/// assert_eq!(SwingHorizontal::RightMiddle.as_str(), "right_middle");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwingHorizontal {
    /// Unit picks the position.
    Auto,
    /// Leftmost position.
    Left,
    /// Between left and center.
    LeftMiddle,
    /// Center.
    Center,
    /// Between center and right.
    RightMiddle,
    /// Rightmost position.
    Right,
    /// Vanes point outwards to both sides.
    Split,
    /// Continuous sweep.
    Swing,
}

impl SwingHorizontal {
    /// All positions, left to right.
    pub const ALL: [Self; 8] = [
        Self::Auto,
        Self::Left,
        Self::LeftMiddle,
        Self::Center,
        Self::RightMiddle,
        Self::Right,
        Self::Split,
        Self::Swing,
    ];

    /// Returns the protocol token.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Left => "left",
            Self::LeftMiddle => "left_middle",
            Self::Center => "center",
            Self::RightMiddle => "right_middle",
            Self::Right => "right",
            Self::Split => "split",
            Self::Swing => "swing",
        }
    }
}

impl fmt::Display for SwingHorizontal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwingHorizontal {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "left" => Ok(Self::Left),
            "left_middle" => Ok(Self::LeftMiddle),
            "center" => Ok(Self::Center),
            "right_middle" => Ok(Self::RightMiddle),
            "right" => Ok(Self::Right),
            "split" => Ok(Self::Split),
            "swing" => Ok(Self::Swing),
            _ => Err(ValidationError::UnknownToken {
                kind: "horizontal swing",
                token: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertical_round_trip() {
        for pos in SwingVertical::ALL {
            assert_eq!(pos.as_str().parse::<SwingVertical>().unwrap(), pos);
        }
    }

    #[test]
    fn horizontal_round_trip() {
        for pos in SwingHorizontal::ALL {
            assert_eq!(pos.as_str().parse::<SwingHorizontal>().unwrap(), pos);
        }
    }

    #[test]
    fn vertical_rejects_horizontal_tokens() {
        assert!("left".parse::<SwingVertical>().is_err());
        assert!("split".parse::<SwingVertical>().is_err());
    }

    #[test]
    fn horizontal_rejects_vertical_tokens() {
        let err = "up".parse::<SwingHorizontal>().unwrap_err();
        assert!(matches!(
            err,
            ValidationError::UnknownToken { kind: "horizontal swing", .. }
        ));
    }
}
