// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lifecycle decisions for devices.

use crate::event::{EventBus, LifecycleEvent};
use crate::registry::Device;
use crate::state::{ChangedField, ChangedFields};

/// Turns field changes into lifecycle events.
///
/// Must be called with the device lock held, right after the change was
/// applied, so that the emitted snapshot matches the change and events for
/// one device are published in order.
///
/// A device is announced with `DeviceBecameLinkable` exactly once, when it
/// is linkable and carries climate data. Before that no other event is
/// emitted for it; afterwards every change produces `DeviceStateChanged`,
/// except availability turning false, which produces
/// `DeviceBecameUnavailable`.
///
/// # Examples
///
/// ```
/// use mielhvac_bridge::event::EventBus;
/// use mielhvac_bridge::manager::LifecycleManager;
/// use mielhvac_bridge::registry::Device;
///
/// let lifecycle = LifecycleManager::new(EventBus::new());
/// let mut device = Device::new("tasmota_1");
/// let changed = device.state_mut().apply_availability(true);
///
/// // Not linkable yet: nothing to report
/// assert!(lifecycle.evaluate(&mut device, &changed).is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct LifecycleManager {
    bus: EventBus,
}

impl LifecycleManager {
    /// Creates a manager publishing on `bus`.
    #[must_use]
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    /// Returns the event bus.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Decides and publishes the events for `changed` on `device`.
    pub fn evaluate(&self, device: &mut Device, changed: &ChangedFields) -> Vec<LifecycleEvent> {
        let mut events = Vec::new();

        if !device.is_announced() {
            if device.is_linkable() && device.state().has_climate_data() {
                device.mark_announced();
                tracing::info!(
                    segment = %device.topic_segment(),
                    name = %device.identity().name(),
                    "Device linkable"
                );
                events.push(LifecycleEvent::linkable(device.snapshot()));
            }
        } else if !changed.is_empty() {
            let mut changed = changed.clone();
            let went_offline =
                changed.contains(ChangedField::Available) && !device.state().available();
            if went_offline {
                changed.remove(ChangedField::Available);
            }
            if !changed.is_empty() {
                tracing::debug!(
                    segment = %device.topic_segment(),
                    changed = %changed,
                    "Device state changed"
                );
                events.push(LifecycleEvent::state_changed(device.snapshot(), changed));
            }
            if went_offline {
                tracing::info!(segment = %device.topic_segment(), "Device unavailable");
                events.push(LifecycleEvent::unavailable(device.snapshot()));
            }
        }

        self.publish_all(&events);
        events
    }

    /// Publishes `DeviceRetired` if the removed device had been announced.
    pub fn retire(&self, device: &Device) -> Option<LifecycleEvent> {
        if !device.is_announced() {
            return None;
        }
        tracing::info!(segment = %device.topic_segment(), "Device retired");
        let event = LifecycleEvent::retired(device.snapshot());
        self.bus.publish(event.clone());
        Some(event)
    }

    fn publish_all(&self, events: &[LifecycleEvent]) {
        for event in events {
            self.bus.publish(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{SensorReading, SettingsRecord};
    use crate::types::{FanSpeed, HardwareAddress, HvacMode};

    fn linkable_device() -> Device {
        let mut device = Device::new("tasmota_1");
        device
            .identity_mut()
            .set_hardware_address(HardwareAddress::new("AA:BB").unwrap());
        device
    }

    fn announce(lifecycle: &LifecycleManager, device: &mut Device) {
        let changed = device.state_mut().apply_sensor(&SensorReading {
            current_temperature: Some(21.0),
        });
        let events = lifecycle.evaluate(device, &changed);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_linkable());
    }

    #[test]
    fn linkable_requires_climate_data() {
        let lifecycle = LifecycleManager::default();
        let mut device = linkable_device();
        let changed = device.state_mut().apply_availability(true);
        assert!(lifecycle.evaluate(&mut device, &changed).is_empty());
        assert!(!device.is_announced());

        announce(&lifecycle, &mut device);
        assert!(device.is_announced());
    }

    #[test]
    fn linkable_requires_address() {
        let lifecycle = LifecycleManager::default();
        let mut device = Device::new("tasmota_1");
        let changed = device.state_mut().apply_sensor(&SensorReading {
            current_temperature: Some(21.0),
        });
        assert!(lifecycle.evaluate(&mut device, &changed).is_empty());
    }

    #[test]
    fn linkable_is_emitted_once() {
        let lifecycle = LifecycleManager::default();
        let mut device = linkable_device();
        announce(&lifecycle, &mut device);

        let record = SettingsRecord {
            mode: Some(HvacMode::Cool),
            fan_speed: Some(FanSpeed::Auto),
            ..SettingsRecord::default()
        };
        let changed = device.state_mut().apply_settings(&record);
        let events = lifecycle.evaluate(&mut device, &changed);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_state_change());
        assert_eq!(events[0].changed().unwrap().len(), 2);
    }

    #[test]
    fn empty_change_emits_nothing() {
        let lifecycle = LifecycleManager::default();
        let mut device = linkable_device();
        announce(&lifecycle, &mut device);
        assert!(lifecycle.evaluate(&mut device, &ChangedFields::new()).is_empty());
    }

    #[test]
    fn offline_emits_unavailable_only() {
        let lifecycle = LifecycleManager::default();
        let mut device = linkable_device();
        device.state_mut().apply_availability(true);
        announce(&lifecycle, &mut device);

        let changed = device.state_mut().apply_availability(false);
        let events = lifecycle.evaluate(&mut device, &changed);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_unavailable());
        assert!(!events[0].snapshot().state.available());

        let changed = device.state_mut().apply_availability(true);
        let events = lifecycle.evaluate(&mut device, &changed);
        assert_eq!(events.len(), 1);
        assert!(events[0].changed().unwrap().contains(ChangedField::Available));
    }

    #[test]
    fn events_are_broadcast() {
        let lifecycle = LifecycleManager::default();
        let mut rx = lifecycle.bus().subscribe();
        let mut device = linkable_device();
        announce(&lifecycle, &mut device);
        assert!(rx.try_recv().unwrap().is_linkable());
    }

    #[test]
    fn retire_only_announced() {
        let lifecycle = LifecycleManager::default();
        let mut device = linkable_device();
        assert!(lifecycle.retire(&device).is_none());
        announce(&lifecycle, &mut device);
        assert!(lifecycle.retire(&device).unwrap().is_retired());
    }
}
