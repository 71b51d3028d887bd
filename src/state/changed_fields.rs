// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sets of changed fields reported by state and identity updates.

use std::collections::BTreeSet;
use std::collections::btree_set;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single field of a device that can change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangedField {
    // ========== Climate State ==========
    /// Operating mode.
    Mode,
    /// Setpoint.
    TargetTemperature,
    /// Room temperature.
    CurrentTemperature,
    /// Fan speed.
    FanSpeed,
    /// Vertical vane.
    SwingVertical,
    /// Horizontal vane.
    SwingHorizontal,
    /// Availability flag.
    Available,

    // ========== Identity ==========
    /// Hardware address.
    HardwareAddress,
    /// Display name.
    DisplayName,
    /// Topic segment.
    TopicSegment,
    /// Hardware model.
    Model,
    /// IP address.
    IpAddress,
}

impl ChangedField {
    /// Returns `true` for identity fields.
    #[must_use]
    pub const fn is_identity(&self) -> bool {
        matches!(
            self,
            Self::HardwareAddress
                | Self::DisplayName
                | Self::TopicSegment
                | Self::Model
                | Self::IpAddress
        )
    }

    /// Returns `true` for settings fields (those reported in `HVACSETTINGS`).
    #[must_use]
    pub const fn is_setting(&self) -> bool {
        matches!(
            self,
            Self::Mode
                | Self::TargetTemperature
                | Self::FanSpeed
                | Self::SwingVertical
                | Self::SwingHorizontal
        )
    }

    /// Returns a stable lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mode => "mode",
            Self::TargetTemperature => "target_temperature",
            Self::CurrentTemperature => "current_temperature",
            Self::FanSpeed => "fan_speed",
            Self::SwingVertical => "swing_vertical",
            Self::SwingHorizontal => "swing_horizontal",
            Self::Available => "available",
            Self::HardwareAddress => "hardware_address",
            Self::DisplayName => "display_name",
            Self::TopicSegment => "topic_segment",
            Self::Model => "model",
            Self::IpAddress => "ip_address",
        }
    }
}

impl fmt::Display for ChangedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered set of [`ChangedField`]s, possibly empty.
///
/// # Examples
///
/// ```
/// use mielhvac_bridge::state::{ChangedField, ChangedFields};
///
/// let changed: ChangedFields = [ChangedField::Mode, ChangedField::FanSpeed].into_iter().collect();
/// assert!(changed.contains(ChangedField::Mode));
/// assert_eq!(changed.to_string(), "mode, fan_speed");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFields(BTreeSet<ChangedField>);

impl ChangedFields {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field.
    pub fn insert(&mut self, field: ChangedField) {
        self.0.insert(field);
    }

    /// Adds every field of `other`.
    pub fn merge(&mut self, other: &Self) {
        self.0.extend(other.0.iter().copied());
    }

    /// Removes a field, returning whether it was present.
    pub fn remove(&mut self, field: ChangedField) -> bool {
        self.0.remove(&field)
    }

    /// Returns `true` if `field` is in the set.
    #[must_use]
    pub fn contains(&self, field: ChangedField) -> bool {
        self.0.contains(&field)
    }

    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of changed fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if any identity field changed.
    #[must_use]
    pub fn has_identity_change(&self) -> bool {
        self.0.iter().any(ChangedField::is_identity)
    }

    /// Iterates over the fields in order.
    pub fn iter(&self) -> impl Iterator<Item = ChangedField> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<ChangedField> for ChangedFields {
    fn from_iter<I: IntoIterator<Item = ChangedField>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<ChangedField> for ChangedFields {
    fn extend<I: IntoIterator<Item = ChangedField>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for ChangedFields {
    type Item = ChangedField;
    type IntoIter = btree_set::IntoIter<ChangedField>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for ChangedFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(field.as_str())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_idempotent() {
        let mut changed = ChangedFields::new();
        changed.insert(ChangedField::Mode);
        changed.insert(ChangedField::Mode);
        assert_eq!(changed.len(), 1);
    }

    #[test]
    fn merge_unions() {
        let mut a: ChangedFields = [ChangedField::Mode].into_iter().collect();
        let b: ChangedFields = [ChangedField::Mode, ChangedField::DisplayName]
            .into_iter()
            .collect();
        a.merge(&b);
        assert_eq!(a.len(), 2);
        assert!(a.has_identity_change());
    }

    #[test]
    fn classification() {
        assert!(ChangedField::TopicSegment.is_identity());
        assert!(!ChangedField::Available.is_identity());
        assert!(ChangedField::SwingHorizontal.is_setting());
        assert!(!ChangedField::CurrentTemperature.is_setting());
    }

    #[test]
    fn display_is_ordered() {
        let changed: ChangedFields = [ChangedField::FanSpeed, ChangedField::Mode]
            .into_iter()
            .collect();
        assert_eq!(changed.to_string(), "mode, fan_speed");
        assert_eq!(ChangedFields::new().to_string(), "");
    }
}
