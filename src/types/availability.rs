// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Availability token carried on the LWT topic.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Device availability as announced by the firmware's last will.
///
/// Parsing is case-insensitive and ignores surrounding whitespace.
///
/// # Examples
///
/// ```
/// use mielhvac_bridge::types::Availability;
///
/// assert_eq!("Online".parse::<Availability>().unwrap(), Availability::Online);
/// assert_eq!(" offline\n".parse::<Availability>().unwrap(), Availability::Offline);
/// assert!("maybe".parse::<Availability>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Availability {
    /// Device is connected to the broker.
    Online,
    /// Device lost its broker connection.
    Offline,
}

impl Availability {
    /// Returns the token as the firmware publishes it.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "Online",
            Self::Offline => "Offline",
        }
    }

    /// Returns `true` for [`Availability::Online`].
    #[must_use]
    pub const fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }
}

impl From<Availability> for bool {
    fn from(value: Availability) -> Self {
        value.is_online()
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Availability {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        if token.eq_ignore_ascii_case("online") {
            Ok(Self::Online)
        } else if token.eq_ignore_ascii_case("offline") {
            Ok(Self::Offline)
        } else {
            Err(DecodeError::UnknownToken {
                field: "LWT".to_string(),
                token: token.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_variants() {
        assert_eq!("Online".parse::<Availability>().unwrap(), Availability::Online);
        assert_eq!("OFFLINE".parse::<Availability>().unwrap(), Availability::Offline);
        assert_eq!("  online ".parse::<Availability>().unwrap(), Availability::Online);
    }

    #[test]
    fn parse_rejects_other_tokens() {
        assert!("".parse::<Availability>().is_err());
        assert!("1".parse::<Availability>().is_err());
        assert!("On line".parse::<Availability>().is_err());
    }

    #[test]
    fn converts_to_bool() {
        assert!(bool::from(Availability::Online));
        assert!(!bool::from(Availability::Offline));
    }
}
