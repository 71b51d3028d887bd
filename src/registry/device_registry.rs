// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Correlation of discovery and telemetry into one device per segment.
//!
//! Devices are keyed by topic segment, the only key telemetry carries, with
//! a secondary index by hardware address once it is learned. Telemetry for
//! an unseen segment creates a provisional record immediately; a later
//! discovery for that segment attaches the address to it.
//!
//! A device whose segment is taken over by another address is not dropped.
//! It is retained under its address, state and announcement intact, and
//! re-linked when that address is announced again. Only an explicit
//! [`DeviceRegistry::remove`] forgets a device.
//!
//! # Locking
//!
//! The index sits behind one `RwLock`; every device sits behind its own
//! `Mutex`. The index lock is always taken before a device lock and never
//! while a device lock is held. Only operations holding the index write
//! lock lock more than one device at a time.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::Device;
use crate::state::{ChangedField, ChangedFields};
use crate::telemetry::DiscoveryRecord;
use crate::types::HardwareAddress;

/// Shared handle to a device record.
pub type DeviceHandle = Arc<Mutex<Device>>;

#[derive(Debug, Default)]
struct Index {
    by_segment: HashMap<String, DeviceHandle>,
    by_address: HashMap<HardwareAddress, String>,
    /// Devices that lost their segment to another address.
    retained: HashMap<HardwareAddress, DeviceHandle>,
}

impl Index {
    /// Drops the record at `segment` and its address entry.
    fn take(&mut self, segment: &str) -> Option<DeviceHandle> {
        let handle = self.by_segment.remove(segment)?;
        if let Some(address) = handle.lock().hardware_address()
            && self.by_address.get(address).is_some_and(|s| s == segment)
        {
            self.by_address.remove(address);
        }
        Some(handle)
    }

    /// Unbinds the record at `segment` and keeps it under `address`.
    fn retain(&mut self, segment: &str, address: &HardwareAddress) -> Option<DeviceHandle> {
        let handle = self.take(segment)?;
        handle.lock().detach();
        tracing::info!(
            segment = %segment,
            address = %address,
            "Device lost its segment, retained for re-linking"
        );
        self.retained.insert(address.clone(), Arc::clone(&handle));
        Some(handle)
    }

    fn create(&mut self, segment: &str, address: &HardwareAddress) -> DeviceHandle {
        let mut device = Device::new(segment);
        device.identity_mut().set_hardware_address(address.clone());
        let handle = Arc::new(Mutex::new(device));
        self.by_segment
            .insert(segment.to_string(), Arc::clone(&handle));
        self.by_address
            .insert(address.clone(), segment.to_string());
        handle
    }
}

/// How a discovery announcement was correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correlation {
    /// Known address on the same segment; descriptive fields updated.
    Updated,
    /// Known address announced on a new segment; the device was re-keyed.
    Rekeyed,
    /// A retained address was announced again and its device re-linked.
    Relinked,
    /// Address attached to a device previously seen only on telemetry.
    Attached,
    /// The segment was bound to a different address; last writer won and
    /// the previous device was retained.
    Ambiguous,
    /// Neither key was known; a device was created.
    Created,
}

/// Result of correlating a discovery announcement, passed to the caller
/// while the device lock is still held.
#[derive(Debug)]
pub struct DiscoveryOutcome {
    /// Which correlation case applied.
    pub correlation: Correlation,
    /// Identity and state fields that changed on the surviving device.
    pub changed: ChangedFields,
    /// Records that lost their segment to the surviving device. They are
    /// retained for re-linking; their locks are not held.
    pub displaced: Vec<DeviceHandle>,
}

/// Registry of known devices.
///
/// # Examples
///
/// ```
/// use mielhvac_bridge::registry::{Correlation, DeviceRegistry};
/// use mielhvac_bridge::telemetry::DiscoveryMapping;
///
/// let registry = DeviceRegistry::new();
///
/// // Telemetry first: a provisional record is created
/// registry.observe_telemetry_topic("tasmota_1", |_device, created| assert!(created));
///
/// // Discovery for the same segment attaches the address
/// let record = DiscoveryMapping::default()
///     .decode("AABB", br#"{"mac":"AA:BB","name":"Hall","t":"tasmota_1"}"#)
///     .unwrap();
/// let correlation = registry.observe_discovery(&record, |_device, outcome| outcome.correlation);
/// assert_eq!(correlation, Correlation::Attached);
/// assert_eq!(registry.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    index: RwLock<Index>,
}

impl DeviceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of devices bound to a segment.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.read().by_segment.len()
    }

    /// Returns `true` if no device is bound to a segment.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.read().by_segment.is_empty()
    }

    /// Returns the device at `segment`.
    #[must_use]
    pub fn get(&self, segment: &str) -> Option<DeviceHandle> {
        self.index.read().by_segment.get(segment).cloned()
    }

    /// Returns the device bound to a segment under `address`.
    #[must_use]
    pub fn get_by_address(&self, address: &HardwareAddress) -> Option<DeviceHandle> {
        let index = self.index.read();
        index
            .by_address
            .get(address)
            .and_then(|segment| index.by_segment.get(segment))
            .cloned()
    }

    /// Returns the retained device for `address`, if its segment was
    /// taken over and it has not been announced again since.
    #[must_use]
    pub fn get_retained(&self, address: &HardwareAddress) -> Option<DeviceHandle> {
        self.index.read().retained.get(address).cloned()
    }

    /// Returns every device bound to a segment.
    #[must_use]
    pub fn all(&self) -> Vec<DeviceHandle> {
        self.index.read().by_segment.values().cloned().collect()
    }

    /// Runs `f` on the device at `segment`, creating it if unseen.
    ///
    /// `f` receives `true` as its second argument when the record was
    /// created by this call. The device lock is held while `f` runs.
    pub fn observe_telemetry_topic<R>(
        &self,
        segment: &str,
        mut f: impl FnMut(&mut Device, bool) -> R,
    ) -> R {
        loop {
            let (handle, created) = self.get_or_create(segment);
            let mut device = handle.lock();
            // A concurrent re-key may have moved the record between the
            // index lookup and the lock.
            if !is_bound_to(&device, segment) {
                continue;
            }
            return f(&mut device, created);
        }
    }

    /// Runs `f` on the device at `segment` if it exists.
    pub fn with_device<R>(&self, segment: &str, f: impl FnOnce(&mut Device) -> R) -> Option<R> {
        let handle = self.get(segment)?;
        let mut device = handle.lock();
        if !is_bound_to(&device, segment) {
            return None;
        }
        Some(f(&mut device))
    }

    fn get_or_create(&self, segment: &str) -> (DeviceHandle, bool) {
        if let Some(handle) = self.get(segment) {
            return (handle, false);
        }
        let mut index = self.index.write();
        if let Some(handle) = index.by_segment.get(segment) {
            return (Arc::clone(handle), false);
        }
        tracing::info!(segment = %segment, "New device seen on telemetry");
        let handle = Arc::new(Mutex::new(Device::new(segment)));
        index
            .by_segment
            .insert(segment.to_string(), Arc::clone(&handle));
        (handle, true)
    }

    /// Correlates a discovery announcement and runs `f` on the surviving
    /// device while its lock is held.
    ///
    /// The cases, in order of precedence:
    ///
    /// 1. The address is known on another segment: the device is re-keyed
    ///    to the announced segment. A provisional record already at that
    ///    segment has its climate state folded in and is dropped; a record
    ///    holding another address is retained.
    /// 2. The address is retained: its device is re-linked to the announced
    ///    segment the same way.
    /// 3. The segment is bound to a different address: the announced
    ///    address gets a device of its own there (last writer wins), the
    ///    previous one is retained and a warning is logged.
    /// 4. The segment is known without an address: the address is attached.
    /// 5. Neither is known: a device is created.
    pub fn observe_discovery<R>(
        &self,
        record: &DiscoveryRecord,
        f: impl FnOnce(&mut Device, &DiscoveryOutcome) -> R,
    ) -> R {
        let mut index = self.index.write();
        let Correlated {
            handle,
            correlation,
            mut changed,
            displaced,
        } = correlate(&mut index, record);

        let mut device = handle.lock();
        drop(index);
        changed.merge(&device.identity_mut().apply_discovery(record));

        tracing::debug!(
            segment = %record.topic_segment,
            address = %record.hardware_address,
            correlation = ?correlation,
            changed = %changed,
            "Discovery correlated"
        );

        let outcome = DiscoveryOutcome {
            correlation,
            changed,
            displaced,
        };
        f(&mut device, &outcome)
    }

    /// Attaches `address` to the device at `segment` if it has none.
    ///
    /// Used for the `STATUS1` fallback. Never overrides an address learned
    /// from discovery and never steals an address already indexed to
    /// another segment. A retained device with that address is re-linked
    /// to `segment`, absorbing the provisional record. Runs `f` with the
    /// changed fields while the device lock is held; returns `None` if the
    /// segment is unknown.
    pub fn attach_hardware_address<R>(
        &self,
        segment: &str,
        address: &HardwareAddress,
        f: impl FnOnce(&mut Device, ChangedFields) -> R,
    ) -> Option<R> {
        let mut index = self.index.write();
        let handle = index.by_segment.get(segment).cloned()?;
        let provisional = handle.lock().hardware_address().is_none();

        if provisional && let Some(retained) = index.retained.remove(address) {
            let relinked = relink(&mut index, retained, segment, address);
            let mut device = relinked.handle.lock();
            drop(index);
            tracing::info!(segment = %segment, address = %address, "Retained device re-linked from status reply");
            return Some(f(&mut device, relinked.changed));
        }

        let mut device = handle.lock();
        let mut changed = ChangedFields::new();
        if provisional {
            match index.by_address.get(address) {
                Some(other) if other != segment => {
                    tracing::warn!(
                        segment = %segment,
                        address = %address,
                        bound_to = %other,
                        "Status reply address already bound to another segment, ignoring"
                    );
                }
                _ => {
                    index
                        .by_address
                        .insert(address.clone(), segment.to_string());
                    changed = device.identity_mut().set_hardware_address(address.clone());
                    tracing::info!(segment = %segment, address = %address, "Hardware address learned from status reply");
                }
            }
        }
        drop(index);
        Some(f(&mut device, changed))
    }

    /// Removes the device at `segment`.
    pub fn remove(&self, segment: &str) -> Option<DeviceHandle> {
        let handle = self.index.write().take(segment)?;
        handle.lock().detach();
        tracing::info!(segment = %segment, "Device removed");
        Some(handle)
    }
}

/// Returns `true` if `device` is still the record bound at `segment`.
fn is_bound_to(device: &Device, segment: &str) -> bool {
    !device.is_detached() && device.topic_segment() == segment
}

struct Correlated {
    handle: DeviceHandle,
    correlation: Correlation,
    changed: ChangedFields,
    displaced: Vec<DeviceHandle>,
}

impl Correlated {
    fn new(handle: DeviceHandle, correlation: Correlation, changed: ChangedFields) -> Self {
        Self {
            handle,
            correlation,
            changed,
            displaced: Vec::new(),
        }
    }
}

/// Resolves which device a discovery record belongs to and updates the
/// index. Descriptive identity fields are left to the caller.
fn correlate(index: &mut Index, record: &DiscoveryRecord) -> Correlated {
    let address = &record.hardware_address;
    let segment = record.topic_segment.as_str();

    if let Some(old_segment) = index.by_address.get(address).cloned() {
        if let Some(handle) = index.by_segment.get(&old_segment).cloned() {
            if old_segment == segment {
                return Correlated::new(handle, Correlation::Updated, ChangedFields::new());
            }
            index.by_segment.remove(&old_segment);
            tracing::info!(
                address = %address,
                from = %old_segment,
                to = %segment,
                "Device re-keyed to new topic segment"
            );
            return rebind(index, handle, segment, address, Correlation::Rekeyed);
        }
        // Stale entry; fall through as if the address were unknown.
        index.by_address.remove(address);
    }

    if let Some(retained) = index.retained.remove(address) {
        tracing::info!(address = %address, segment = %segment, "Retained device announced again");
        return relink(index, retained, segment, address);
    }

    let Some(handle) = index.by_segment.get(segment).cloned() else {
        tracing::info!(segment = %segment, address = %address, "New device seen on discovery");
        let handle = index.create(segment, address);
        return Correlated::new(handle, Correlation::Created, ChangedFields::new());
    };

    let previous = handle.lock().hardware_address().cloned();
    match previous {
        Some(previous) if previous != *address => {
            tracing::warn!(
                segment = %segment,
                previous = %previous,
                address = %address,
                "Correlation ambiguity: segment announced with a new address, last writer wins"
            );
            let displaced = index.retain(segment, &previous);
            let handle = index.create(segment, address);
            Correlated {
                handle,
                correlation: Correlation::Ambiguous,
                changed: ChangedFields::new(),
                displaced: displaced.into_iter().collect(),
            }
        }
        Some(_) => {
            index
                .by_address
                .insert(address.clone(), segment.to_string());
            Correlated::new(handle, Correlation::Updated, ChangedFields::new())
        }
        None => {
            index
                .by_address
                .insert(address.clone(), segment.to_string());
            let changed = handle
                .lock()
                .identity_mut()
                .set_hardware_address(address.clone());
            Correlated::new(handle, Correlation::Attached, changed)
        }
    }
}

/// Binds a retained device to `segment` again.
///
/// The segment is always reported as changed: the device was unbound, even
/// when it returns to the segment it last held.
fn relink(
    index: &mut Index,
    handle: DeviceHandle,
    segment: &str,
    address: &HardwareAddress,
) -> Correlated {
    handle.lock().reattach();
    let mut correlated = rebind(index, handle, segment, address, Correlation::Relinked);
    correlated.changed.insert(ChangedField::TopicSegment);
    correlated
}

/// Binds `handle` to `segment` under `address`.
///
/// The caller has already unbound `handle` from any previous segment. A
/// provisional record at `segment` is folded in; a record holding another
/// address is retained.
fn rebind(
    index: &mut Index,
    handle: DeviceHandle,
    segment: &str,
    address: &HardwareAddress,
    correlation: Correlation,
) -> Correlated {
    let mut changed = ChangedFields::new();
    let mut displaced = Vec::new();

    let occupant_address = index
        .by_segment
        .get(segment)
        .map(|occupant| occupant.lock().hardware_address().cloned());
    match occupant_address {
        Some(Some(other)) => {
            tracing::warn!(
                segment = %segment,
                address = %address,
                displaced = %other,
                "Correlation ambiguity: segment taken over by re-keyed device"
            );
            displaced.extend(index.retain(segment, &other));
        }
        Some(None) => {
            if let Some(occupant) = index.take(segment) {
                let mut occupant_device = occupant.lock();
                occupant_device.detach();
                let provisional = occupant_device.state().clone();
                drop(occupant_device);
                changed.merge(&handle.lock().state_mut().absorb(&provisional));
            }
        }
        None => {}
    }

    changed.merge(&handle.lock().identity_mut().set_topic_segment(segment));
    index
        .by_segment
        .insert(segment.to_string(), Arc::clone(&handle));
    index
        .by_address
        .insert(address.clone(), segment.to_string());

    Correlated {
        handle,
        correlation,
        changed,
        displaced,
    }
}
