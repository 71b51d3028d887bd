// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lifecycle event types.

use serde::{Deserialize, Serialize};

use crate::registry::DeviceSnapshot;
use crate::state::ChangedFields;

/// Events emitted by the lifecycle manager.
///
/// Every event carries a snapshot of the device taken while its lock was
/// held, so the snapshot matches the state that produced the event.
///
/// # Examples
///
/// ```
/// use mielhvac_bridge::event::LifecycleEvent;
/// use mielhvac_bridge::registry::Device;
///
/// let snapshot = Device::new("tasmota_hall").snapshot();
/// let event = LifecycleEvent::retired(snapshot);
///
/// assert!(event.is_retired());
/// assert_eq!(event.topic_segment(), "tasmota_hall");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LifecycleEvent {
    /// The device is linkable and has climate data; emitted once.
    DeviceBecameLinkable(DeviceSnapshot),

    /// State or identity of an announced device changed.
    DeviceStateChanged {
        /// The device after the change.
        snapshot: DeviceSnapshot,
        /// Fields that changed.
        changed: ChangedFields,
    },

    /// An announced device went unavailable.
    DeviceBecameUnavailable(DeviceSnapshot),

    /// An announced device was removed from the registry.
    DeviceRetired(DeviceSnapshot),
}

impl LifecycleEvent {
    /// Returns the device snapshot carried by this event.
    #[must_use]
    pub fn snapshot(&self) -> &DeviceSnapshot {
        match self {
            Self::DeviceBecameLinkable(snapshot)
            | Self::DeviceStateChanged { snapshot, .. }
            | Self::DeviceBecameUnavailable(snapshot)
            | Self::DeviceRetired(snapshot) => snapshot,
        }
    }

    /// Returns the topic segment of the device.
    #[must_use]
    pub fn topic_segment(&self) -> &str {
        self.snapshot().topic_segment()
    }

    /// Returns the changed fields for a state change event.
    #[must_use]
    pub fn changed(&self) -> Option<&ChangedFields> {
        match self {
            Self::DeviceStateChanged { changed, .. } => Some(changed),
            _ => None,
        }
    }

    /// Returns `true` if this is a linkable event.
    #[must_use]
    pub fn is_linkable(&self) -> bool {
        matches!(self, Self::DeviceBecameLinkable(_))
    }

    /// Returns `true` if this is a state change event.
    #[must_use]
    pub fn is_state_change(&self) -> bool {
        matches!(self, Self::DeviceStateChanged { .. })
    }

    /// Returns `true` if this is an unavailability event.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::DeviceBecameUnavailable(_))
    }

    /// Returns `true` if this is a retirement event.
    #[must_use]
    pub fn is_retired(&self) -> bool {
        matches!(self, Self::DeviceRetired(_))
    }

    /// Creates a linkable event.
    #[must_use]
    pub fn linkable(snapshot: DeviceSnapshot) -> Self {
        Self::DeviceBecameLinkable(snapshot)
    }

    /// Creates a state changed event.
    #[must_use]
    pub fn state_changed(snapshot: DeviceSnapshot, changed: ChangedFields) -> Self {
        Self::DeviceStateChanged { snapshot, changed }
    }

    /// Creates an unavailability event.
    #[must_use]
    pub fn unavailable(snapshot: DeviceSnapshot) -> Self {
        Self::DeviceBecameUnavailable(snapshot)
    }

    /// Creates a retirement event.
    #[must_use]
    pub fn retired(snapshot: DeviceSnapshot) -> Self {
        Self::DeviceRetired(snapshot)
    }
}
