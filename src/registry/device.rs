// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A known heat pump: identity plus climate state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{ChangedField, ChangedFields, ClimateState};
use crate::telemetry::DiscoveryRecord;
use crate::types::HardwareAddress;

/// Prefix Tasmota puts in front of default device topics.
const DEFAULT_TOPIC_PREFIX: &str = "tasmota_";

/// Suffix of the climate entity's unique identifier.
const UNIQUE_ID_SUFFIX: &str = "_mielhvac_climate";

/// Identity of a device as learned from discovery and telemetry.
///
/// The topic segment is known from the first sighting. The hardware
/// address and display name arrive with discovery (or, for the address,
/// a `STATUS1` reply).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Durable identity key, once known.
    pub hardware_address: Option<HardwareAddress>,
    /// Topic segment used in telemetry and command topics.
    pub topic_segment: String,
    /// Human-readable name, once announced.
    pub display_name: Option<String>,
    /// Hardware model, if announced.
    pub model: Option<String>,
    /// IP address, if announced.
    pub ip_address: Option<String>,
}

impl DeviceIdentity {
    /// Creates an identity known only by its topic segment.
    #[must_use]
    pub fn new(topic_segment: impl Into<String>) -> Self {
        Self {
            hardware_address: None,
            topic_segment: topic_segment.into(),
            display_name: None,
            model: None,
            ip_address: None,
        }
    }

    /// Returns the announced name, or one derived from the topic segment.
    ///
    /// ```
    /// use mielhvac_bridge::registry::DeviceIdentity;
    ///
    /// assert_eq!(DeviceIdentity::new("tasmota_living").name(), "living");
    /// ```
    #[must_use]
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or_else(|| {
            self.topic_segment
                .strip_prefix(DEFAULT_TOPIC_PREFIX)
                .filter(|rest| !rest.is_empty())
                .unwrap_or(&self.topic_segment)
        })
    }

    /// Returns the climate entity's unique identifier.
    ///
    /// Derived from the hardware address so it survives topic changes.
    #[must_use]
    pub fn unique_id(&self) -> Option<String> {
        self.hardware_address
            .as_ref()
            .map(|mac| format!("{}{UNIQUE_ID_SUFFIX}", mac.as_str().to_ascii_lowercase()))
    }

    /// Returns `true` when both the segment and the hardware address are known.
    #[must_use]
    pub fn is_linkable(&self) -> bool {
        self.hardware_address.is_some() && !self.topic_segment.is_empty()
    }

    /// Applies the descriptive fields of a discovery record.
    ///
    /// The address and segment are handled by the registry.
    pub(crate) fn apply_discovery(&mut self, record: &DiscoveryRecord) -> ChangedFields {
        let mut changed = ChangedFields::new();
        if replace(&mut self.display_name, Some(&record.display_name)) {
            changed.insert(ChangedField::DisplayName);
        }
        if replace(&mut self.model, record.model.as_ref()) {
            changed.insert(ChangedField::Model);
        }
        if replace(&mut self.ip_address, record.ip_address.as_ref()) {
            changed.insert(ChangedField::IpAddress);
        }
        changed
    }

    pub(crate) fn set_hardware_address(&mut self, address: HardwareAddress) -> ChangedFields {
        let mut changed = ChangedFields::new();
        if self.hardware_address.as_ref() != Some(&address) {
            self.hardware_address = Some(address);
            changed.insert(ChangedField::HardwareAddress);
        }
        changed
    }

    pub(crate) fn set_topic_segment(&mut self, segment: &str) -> ChangedFields {
        let mut changed = ChangedFields::new();
        if self.topic_segment != segment {
            segment.clone_into(&mut self.topic_segment);
            changed.insert(ChangedField::TopicSegment);
        }
        changed
    }
}

/// Replaces `slot` with a present `value` if it differs.
fn replace(slot: &mut Option<String>, value: Option<&String>) -> bool {
    match value {
        Some(v) if slot.as_ref() != Some(v) => {
            *slot = Some(v.clone());
            true
        }
        _ => false,
    }
}

/// A device record held by the registry.
#[derive(Debug, Clone)]
pub struct Device {
    identity: DeviceIdentity,
    state: ClimateState,
    last_seen: Option<DateTime<Utc>>,
    /// Set once `DeviceBecameLinkable` has been emitted.
    announced: bool,
    /// Set once a status query has been requested for the hardware address.
    status_requested: bool,
    /// Set while the record is not bound to a segment.
    detached: bool,
}

impl Device {
    /// Creates a device known only by its topic segment.
    #[must_use]
    pub fn new(topic_segment: impl Into<String>) -> Self {
        Self {
            identity: DeviceIdentity::new(topic_segment),
            state: ClimateState::new(),
            last_seen: None,
            announced: false,
            status_requested: false,
            detached: false,
        }
    }

    /// Returns the identity.
    #[must_use]
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub(crate) fn identity_mut(&mut self) -> &mut DeviceIdentity {
        &mut self.identity
    }

    /// Returns the climate state.
    #[must_use]
    pub fn state(&self) -> &ClimateState {
        &self.state
    }

    /// Returns the climate state for updating.
    pub fn state_mut(&mut self) -> &mut ClimateState {
        &mut self.state
    }

    /// Returns the topic segment.
    #[must_use]
    pub fn topic_segment(&self) -> &str {
        &self.identity.topic_segment
    }

    /// Returns the hardware address, once known.
    #[must_use]
    pub fn hardware_address(&self) -> Option<&HardwareAddress> {
        self.identity.hardware_address.as_ref()
    }

    /// Returns `true` when both the segment and the hardware address are known.
    #[must_use]
    pub fn is_linkable(&self) -> bool {
        self.identity.is_linkable()
    }

    /// Returns `true` once at least one settings field is known.
    #[must_use]
    pub fn is_operable(&self) -> bool {
        self.state.is_operable()
    }

    /// Returns the time of the last inbound message.
    #[must_use]
    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.last_seen
    }

    /// Records that a message was received at `now`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_seen = Some(now);
    }

    /// Returns `true` once the device has been announced to the entity layer.
    #[must_use]
    pub fn is_announced(&self) -> bool {
        self.announced
    }

    pub(crate) fn mark_announced(&mut self) {
        self.announced = true;
    }

    /// Marks the status query as requested; returns `false` if it already was.
    pub(crate) fn claim_status_request(&mut self) -> bool {
        !std::mem::replace(&mut self.status_requested, true)
    }

    pub(crate) fn is_detached(&self) -> bool {
        self.detached
    }

    pub(crate) fn detach(&mut self) {
        self.detached = true;
    }

    pub(crate) fn reattach(&mut self) {
        self.detached = false;
    }

    /// Returns a point-in-time copy of the device.
    #[must_use]
    pub fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            identity: self.identity.clone(),
            state: self.state.clone(),
            last_seen: self.last_seen,
        }
    }
}

/// Point-in-time copy of a device handed to the entity layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    /// Identity at the time of the snapshot.
    pub identity: DeviceIdentity,
    /// Climate state at the time of the snapshot.
    pub state: ClimateState,
    /// Time of the last inbound message.
    pub last_seen: Option<DateTime<Utc>>,
}

impl DeviceSnapshot {
    /// Returns the topic segment.
    #[must_use]
    pub fn topic_segment(&self) -> &str {
        &self.identity.topic_segment
    }

    /// Returns the climate entity's unique identifier.
    #[must_use]
    pub fn unique_id(&self) -> Option<String> {
        self.identity.unique_id()
    }

    /// Returns the display name, falling back to the topic segment.
    #[must_use]
    pub fn name(&self) -> &str {
        self.identity.name()
    }
}
