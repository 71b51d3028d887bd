// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hardware (MAC) address of a device.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Normalized hardware address.
///
/// Discovery payloads carry the MAC without separators while `STATUS1`
/// replies use colons. Both normalize to the same upper-case hex string
/// so they index the same device.
///
/// # Examples
///
/// ```
/// use mielhvac_bridge::types::HardwareAddress;
///
/// let a = HardwareAddress::new("aa:bb:cc:dd:ee:ff").unwrap();
/// let b = HardwareAddress::new("AABBCCDDEEFF").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "AABBCCDDEEFF");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HardwareAddress(String);

impl HardwareAddress {
    /// Creates a normalized address.
    ///
    /// Separators (`:`, `-`, `.`) and surrounding whitespace are removed and
    /// hex digits are upper-cased.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::InvalidValue` if nothing remains after
    /// normalization or the value contains characters other than
    /// alphanumerics and separators.
    pub fn new(raw: &str) -> Result<Self, DecodeError> {
        let mut normalized = String::with_capacity(raw.len());
        for c in raw.trim().chars() {
            match c {
                ':' | '-' | '.' => {}
                c if c.is_ascii_alphanumeric() => normalized.push(c.to_ascii_uppercase()),
                _ => {
                    return Err(DecodeError::InvalidValue {
                        field: "mac".to_string(),
                        message: format!("unexpected character {c:?} in {raw:?}"),
                    });
                }
            }
        }
        if normalized.is_empty() {
            return Err(DecodeError::InvalidValue {
                field: "mac".to_string(),
                message: "empty hardware address".to_string(),
            });
        }
        Ok(Self(normalized))
    }

    /// Returns the normalized address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HardwareAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for HardwareAddress {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for HardwareAddress {
    type Error = DecodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<HardwareAddress> for String {
    fn from(value: HardwareAddress) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_are_ignored() {
        let colon = HardwareAddress::new("AA:BB:CC:DD:EE:FF").unwrap();
        let dash = HardwareAddress::new("aa-bb-cc-dd-ee-ff").unwrap();
        let bare = HardwareAddress::new("aabbccddeeff").unwrap();
        assert_eq!(colon, dash);
        assert_eq!(colon, bare);
    }

    #[test]
    fn short_addresses_are_kept() {
        let addr = HardwareAddress::new("AA:BB").unwrap();
        assert_eq!(addr.as_str(), "AABB");
    }

    #[test]
    fn empty_is_rejected() {
        assert!(HardwareAddress::new("").is_err());
        assert!(HardwareAddress::new(" :: ").is_err());
    }

    #[test]
    fn junk_is_rejected() {
        assert!(HardwareAddress::new("AA BB").is_err());
        assert!(HardwareAddress::new("AA/BB").is_err());
    }

    #[test]
    fn serde_normalizes() {
        let addr: HardwareAddress = serde_json::from_str("\"de:ad:be:ef:00:01\"").unwrap();
        assert_eq!(serde_json::to_string(&addr).unwrap(), "\"DEADBEEF0001\"");
    }
}
