// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The bridge engine: one inbound path, snapshot queries and intents.

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::broadcast;

use super::{BridgeConfig, LifecycleManager};
use crate::command::{HvacIntent, OutboundMessage, StatusCommand, build_command, Command};
use crate::error::{DecodeError, Error, Result};
use crate::event::{EventBus, LifecycleEvent};
use crate::protocol::{CommandSink, TopicKind};
use crate::registry::{Device, DeviceHandle, DeviceRegistry, DeviceSnapshot};
use crate::state::ChangedFields;
use crate::telemetry::{decode_availability, decode_sensor, decode_settings, decode_status};
use crate::types::HardwareAddress;

/// What handling one inbound message produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageOutcome {
    /// Lifecycle events, in emission order. Already broadcast.
    pub events: Vec<LifecycleEvent>,
    /// Messages the caller should publish, such as a `Status 1` query.
    pub follow_ups: Vec<OutboundMessage>,
}

impl MessageOutcome {
    /// Returns `true` if nothing was produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.follow_ups.is_empty()
    }

    fn from_events(events: Vec<LifecycleEvent>) -> Self {
        Self {
            events,
            follow_ups: Vec::new(),
        }
    }
}

/// Correlates discovery and telemetry into devices and keeps their climate
/// state in sync.
///
/// The bridge does no I/O. Feed it every message received on the
/// [subscription filters](crate::protocol::TopicScheme::subscription_filters)
/// through [`Bridge::handle_message`] and publish what comes back in
/// [`MessageOutcome::follow_ups`]. All methods take `&self`; share the
/// bridge behind an `Arc` to process messages from several tasks.
///
/// # Examples
///
/// ```
/// use mielhvac_bridge::manager::Bridge;
///
/// let bridge = Bridge::default();
///
/// bridge.handle_message(
///     "tasmota/discovery/AABBCCDDEEFF/config",
///     br#"{"mac":"AABBCCDDEEFF","dn":"Living Room","t":"tasmota_1"}"#,
/// );
/// let outcome = bridge.handle_message(
///     "tele/tasmota_1/SENSOR",
///     br#"{"MiElHVAC":{"Temperature":21.5}}"#,
/// );
///
/// assert_eq!(outcome.events.len(), 1);
/// assert!(outcome.events[0].is_linkable());
///
/// let snapshot = bridge.snapshot("tasmota_1").unwrap();
/// assert_eq!(snapshot.state.current_temperature(), Some(21.5));
/// assert!(snapshot.state.mode().is_none());
/// ```
#[derive(Debug)]
pub struct Bridge {
    config: BridgeConfig,
    registry: DeviceRegistry,
    lifecycle: LifecycleManager,
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new(BridgeConfig::default())
    }
}

impl Bridge {
    /// Creates a bridge with the given configuration.
    #[must_use]
    pub fn new(config: BridgeConfig) -> Self {
        let bus = EventBus::with_capacity(config.event_capacity);
        Self {
            config,
            registry: DeviceRegistry::new(),
            lifecycle: LifecycleManager::new(bus),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Returns the device registry.
    #[must_use]
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Returns the event bus.
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        self.lifecycle.bus()
    }

    /// Subscribes to lifecycle events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.lifecycle.bus().subscribe()
    }

    // ========== Inbound ==========

    /// Handles one inbound message, timestamped now.
    ///
    /// Undecodable payloads and unrecognized topics are logged and
    /// dropped; they never surface as errors.
    pub fn handle_message(&self, topic: &str, payload: &[u8]) -> MessageOutcome {
        self.handle_message_at(topic, payload, Utc::now())
    }

    /// Handles one inbound message received at `now`.
    pub fn handle_message_at(
        &self,
        topic: &str,
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> MessageOutcome {
        let kind = self.config.topic_scheme.classify(topic);
        let result = match &kind {
            TopicKind::Discovery { identifier } => self.on_discovery(identifier, payload, now),
            TopicKind::Availability { segment } => self.on_availability(segment, payload, now),
            TopicKind::Sensor { segment } => self.on_sensor(segment, payload, now),
            TopicKind::Settings { segment } => self.on_settings(segment, payload, now),
            TopicKind::Status { segment } => self.on_status(segment, payload, now),
            TopicKind::Unrecognized => {
                tracing::trace!(topic = %topic, "Ignoring unrecognized topic");
                return MessageOutcome::default();
            }
        };

        result.unwrap_or_else(|e| {
            tracing::debug!(topic = %topic, error = %e, "Dropping undecodable payload");
            MessageOutcome::default()
        })
    }

    fn on_discovery(
        &self,
        identifier: &str,
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> std::result::Result<MessageOutcome, DecodeError> {
        let record = self.config.discovery.decode(identifier, payload)?;
        let mut displaced: Vec<DeviceHandle> = Vec::new();

        let mut events = self.registry.observe_discovery(&record, |device, outcome| {
            device.touch(now);
            displaced.extend(outcome.displaced.iter().cloned());
            self.lifecycle.evaluate(device, &outcome.changed)
        });

        // Displaced devices stay retained and unavailable until their
        // address is announced again.
        for handle in displaced {
            let mut device = handle.lock();
            if !device.is_detached() {
                continue;
            }
            let changed = device.state_mut().apply_availability(false);
            if device.is_announced() {
                events.extend(self.lifecycle.evaluate(&mut device, &changed));
            }
        }
        Ok(MessageOutcome::from_events(events))
    }

    fn on_availability(
        &self,
        segment: &str,
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> std::result::Result<MessageOutcome, DecodeError> {
        let availability = decode_availability(payload)?;
        tracing::debug!(segment = %segment, availability = %availability, "Availability update");
        Ok(self.on_telemetry(segment, now, |device| {
            device
                .state_mut()
                .apply_availability(availability.is_online())
        }))
    }

    fn on_sensor(
        &self,
        segment: &str,
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> std::result::Result<MessageOutcome, DecodeError> {
        let reading = decode_sensor(payload, &self.config.model_key)?;
        Ok(self.on_telemetry(segment, now, |device| {
            device.state_mut().apply_sensor(&reading)
        }))
    }

    fn on_settings(
        &self,
        segment: &str,
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> std::result::Result<MessageOutcome, DecodeError> {
        let record = decode_settings(payload)?;
        for rejection in &record.rejections {
            tracing::warn!(
                segment = %segment,
                field = %rejection.field,
                value = %rejection.value,
                reason = %rejection.reason,
                "Rejected settings field"
            );
        }
        Ok(self.on_telemetry(segment, now, |device| {
            device.state_mut().apply_settings(&record)
        }))
    }

    fn on_status(
        &self,
        segment: &str,
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> std::result::Result<MessageOutcome, DecodeError> {
        let Some(address) = decode_status(payload)? else {
            tracing::debug!(segment = %segment, "Status reply without MAC address");
            return Ok(MessageOutcome::default());
        };
        let events = self
            .registry
            .attach_hardware_address(segment, &address, |device, changed| {
                device.touch(now);
                self.lifecycle.evaluate(device, &changed)
            })
            .unwrap_or_default();
        Ok(MessageOutcome::from_events(events))
    }

    /// Applies a telemetry update to the device at `segment`, creating a
    /// provisional record on first sighting.
    fn on_telemetry(
        &self,
        segment: &str,
        now: DateTime<Utc>,
        mut apply: impl FnMut(&mut Device) -> ChangedFields,
    ) -> MessageOutcome {
        let mut follow_ups = Vec::new();
        let events = self.registry.observe_telemetry_topic(segment, |device, _created| {
            device.touch(now);
            let changed = apply(device);
            if let Some(request) = self.status_request(device) {
                follow_ups.push(request);
            }
            self.lifecycle.evaluate(device, &changed)
        });
        MessageOutcome { events, follow_ups }
    }

    /// Returns a `Status 1` query for a device that still lacks an address,
    /// at most once per device.
    fn status_request(&self, device: &mut Device) -> Option<OutboundMessage> {
        if !self.config.request_status_on_unknown_address
            || device.hardware_address().is_some()
            || !device.claim_status_request()
        {
            return None;
        }
        match StatusCommand::device_parameters()
            .to_message(&self.config.topic_scheme, device.topic_segment())
        {
            Ok(message) => {
                tracing::debug!(segment = %device.topic_segment(), "Requesting status for MAC address");
                Some(message)
            }
            Err(e) => {
                tracing::warn!(segment = %device.topic_segment(), error = %e, "Cannot request status");
                None
            }
        }
    }

    // ========== Availability ==========

    /// Marks devices unavailable when nothing was heard from them for
    /// longer than the configured staleness window. Devices are never
    /// removed. Does nothing when staleness is disabled.
    pub fn expire_stale(&self, now: DateTime<Utc>) -> Vec<LifecycleEvent> {
        let Some(window) = self.config.stale_after else {
            return Vec::new();
        };
        let window = TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX);
        self.mark_unavailable(|device| {
            device
                .last_seen()
                .is_some_and(|seen| now.signed_duration_since(seen) > window)
        })
    }

    /// Marks every available device unavailable after the bus connection
    /// was lost.
    pub fn handle_transport_lost(&self) -> Vec<LifecycleEvent> {
        tracing::info!("Transport lost, marking devices unavailable");
        self.mark_unavailable(|_| true)
    }

    fn mark_unavailable(&self, predicate: impl Fn(&Device) -> bool) -> Vec<LifecycleEvent> {
        let mut events = Vec::new();
        for handle in self.registry.all() {
            let mut device = handle.lock();
            if device.is_detached() || !device.state().available() || !predicate(&device) {
                continue;
            }
            tracing::debug!(segment = %device.topic_segment(), "Marking device unavailable");
            let changed = device.state_mut().apply_availability(false);
            events.extend(self.lifecycle.evaluate(&mut device, &changed));
        }
        events
    }

    // ========== Queries ==========

    /// Returns a snapshot of the linkable device at `segment`.
    #[must_use]
    pub fn snapshot(&self, segment: &str) -> Option<DeviceSnapshot> {
        self.registry
            .with_device(segment, |device| device.is_linkable().then(|| device.snapshot()))
            .flatten()
    }

    /// Returns a snapshot of the device holding `address`.
    ///
    /// A device whose segment was taken over by another address is still
    /// returned, unavailable and with the segment it last held.
    #[must_use]
    pub fn snapshot_by_address(&self, address: &HardwareAddress) -> Option<DeviceSnapshot> {
        if let Some(handle) = self.registry.get_by_address(address) {
            let device = handle.lock();
            if !device.is_detached() && device.is_linkable() {
                return Some(device.snapshot());
            }
        }
        let handle = self.registry.get_retained(address)?;
        let device = handle.lock();
        device.is_linkable().then(|| device.snapshot())
    }

    /// Returns snapshots of every known device, linkable or not.
    #[must_use]
    pub fn devices(&self) -> Vec<DeviceSnapshot> {
        self.registry
            .all()
            .iter()
            .filter_map(|handle| {
                let device = handle.lock();
                (!device.is_detached()).then(|| device.snapshot())
            })
            .collect()
    }

    // ========== Intents ==========

    /// Validates `intent` for the device at `segment` and renders it.
    ///
    /// No state is changed: the device confirms through its next
    /// settings message.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` for an unknown segment and
    /// `Error::Validation` for an invalid intent.
    pub fn prepare_intent(&self, segment: &str, intent: HvacIntent) -> Result<OutboundMessage> {
        if self.registry.with_device(segment, |_| ()).is_none() {
            return Err(Error::DeviceNotFound);
        }
        Ok(build_command(&self.config.topic_scheme, segment, intent)?)
    }

    /// Validates `intent` and publishes it through `sink`.
    ///
    /// Publication is attempted once.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Bridge::prepare_intent`], or
    /// `Error::Delivery` if the sink fails.
    pub async fn submit_intent<S: CommandSink>(
        &self,
        sink: &S,
        segment: &str,
        intent: HvacIntent,
    ) -> Result<()> {
        let message = self.prepare_intent(segment, intent)?;
        tracing::debug!(
            segment = %segment,
            topic = %message.topic,
            payload = %message.payload,
            "Submitting intent"
        );
        sink.publish(&message).await?;
        Ok(())
    }

    // ========== Removal ==========

    /// Removes the device at `segment`.
    ///
    /// Returns `DeviceRetired` if the device had been announced.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` for an unknown segment.
    pub fn remove_device(&self, segment: &str) -> Result<Option<LifecycleEvent>> {
        let handle = self.registry.remove(segment).ok_or(Error::DeviceNotFound)?;
        let device = handle.lock();
        Ok(self.lifecycle.retire(&device))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use parking_lot::Mutex;

    use super::*;
    use crate::error::DeliveryError;
    use crate::state::ChangedField;
    use crate::types::{FanSpeed, HvacMode};

    const DISCOVERY_TOPIC: &str = "tasmota/discovery/AABBCCDDEEFF/config";
    const DISCOVERY: &[u8] = br#"{"mac":"AABBCCDDEEFF","dn":"Hall","t":"tasmota_1"}"#;
    const SENSOR: &[u8] = br#"{"MiElHVAC":{"Temperature":21.5}}"#;

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<OutboundMessage>>,
    }

    impl CommandSink for RecordingSink {
        async fn publish(&self, message: &OutboundMessage) -> std::result::Result<(), DeliveryError> {
            self.sent.lock().push(message.clone());
            Ok(())
        }
    }

    struct FailingSink;

    impl CommandSink for FailingSink {
        async fn publish(&self, _message: &OutboundMessage) -> std::result::Result<(), DeliveryError> {
            Err(DeliveryError::ChannelClosed("gone".to_string()))
        }
    }

    fn announced_bridge(config: BridgeConfig) -> Bridge {
        let bridge = Bridge::new(config);
        bridge.handle_message(DISCOVERY_TOPIC, DISCOVERY);
        bridge.handle_message("tele/tasmota_1/LWT", b"Online");
        let outcome = bridge.handle_message("tele/tasmota_1/SENSOR", SENSOR);
        assert!(outcome.events[0].is_linkable());
        bridge
    }

    // ========== Inbound ==========

    #[test]
    fn unrecognized_topic_is_ignored() {
        let bridge = Bridge::default();
        assert!(bridge.handle_message("cmnd/tasmota_1/Power", b"ON").is_empty());
        assert!(bridge.registry().is_empty());
    }

    #[test]
    fn bad_payload_is_dropped() {
        let bridge = Bridge::default();
        assert!(bridge.handle_message("tele/tasmota_1/SENSOR", b"{oops").is_empty());
        assert!(bridge.handle_message("tele/tasmota_1/LWT", b"Maybe").is_empty());
        assert!(bridge.handle_message(DISCOVERY_TOPIC, br#"{"t":"x"}"#).is_empty());
        assert!(bridge.registry().is_empty());
    }

    #[test]
    fn telemetry_first_requests_status_once() {
        let bridge = Bridge::default();
        let outcome = bridge.handle_message("tele/tasmota_1/SENSOR", SENSOR);
        assert!(outcome.events.is_empty());
        assert_eq!(
            outcome.follow_ups,
            vec![OutboundMessage::new("cmnd/tasmota_1/Status", "1")]
        );

        let outcome = bridge.handle_message("tele/tasmota_1/LWT", b"Online");
        assert!(outcome.follow_ups.is_empty());
    }

    #[test]
    fn status_requests_can_be_disabled() {
        let bridge = Bridge::new(BridgeConfig::default().with_status_requests(false));
        let outcome = bridge.handle_message("tele/tasmota_1/SENSOR", SENSOR);
        assert!(outcome.follow_ups.is_empty());
    }

    #[test]
    fn status_reply_links_device() {
        let bridge = Bridge::default();
        bridge.handle_message("tele/tasmota_1/SENSOR", SENSOR);
        assert!(bridge.snapshot("tasmota_1").is_none());

        let outcome = bridge.handle_message(
            "stat/tasmota_1/STATUS1",
            br#"{"StatusNET":{"Mac":"AA:BB:CC:DD:EE:FF"}}"#,
        );
        assert_eq!(outcome.events.len(), 1);
        assert!(outcome.events[0].is_linkable());

        let address = HardwareAddress::new("AABBCCDDEEFF").unwrap();
        let snapshot = bridge.snapshot_by_address(&address).unwrap();
        assert_eq!(snapshot.topic_segment(), "tasmota_1");
    }

    #[test]
    fn status_reply_for_unknown_segment_is_ignored() {
        let bridge = Bridge::default();
        let outcome = bridge.handle_message("stat/ghost/STATUS1", br#"{"Mac":"AA:BB"}"#);
        assert!(outcome.is_empty());
        assert!(bridge.registry().is_empty());
    }

    #[test]
    fn rejected_settings_keep_valid_fields() {
        let bridge = announced_bridge(BridgeConfig::default());
        let outcome = bridge.handle_message(
            "tele/tasmota_1/HVACSETTINGS",
            br#"{"HAMode":"heat","Temp":22.3,"FanSpeed":"turbo"}"#,
        );
        assert_eq!(outcome.events.len(), 1);
        let changed = outcome.events[0].changed().unwrap();
        assert_eq!(changed.iter().collect::<Vec<_>>(), vec![ChangedField::Mode]);

        let snapshot = bridge.snapshot("tasmota_1").unwrap();
        assert_eq!(snapshot.state.mode(), Some(HvacMode::Heat));
        assert!(snapshot.state.target_temperature().is_none());
    }

    #[test]
    fn last_seen_is_recorded() {
        let bridge = Bridge::default();
        let now = Utc::now();
        bridge.handle_message_at("tele/tasmota_1/LWT", b"Online", now);
        let devices = bridge.devices();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].last_seen, Some(now));
    }

    // ========== Availability ==========

    #[test]
    fn expire_stale_marks_unavailable() {
        let config = BridgeConfig::default().with_stale_after(Duration::from_secs(60));
        let bridge = announced_bridge(config);
        let seen = bridge.devices()[0].last_seen.unwrap();

        assert!(bridge.expire_stale(seen + TimeDelta::seconds(30)).is_empty());

        let events = bridge.expire_stale(seen + TimeDelta::seconds(61));
        assert_eq!(events.len(), 1);
        assert!(events[0].is_unavailable());
        assert!(bridge.expire_stale(seen + TimeDelta::seconds(120)).is_empty());

        // Still known, just unavailable
        let snapshot = bridge.snapshot("tasmota_1").unwrap();
        assert!(!snapshot.state.available());
        assert_eq!(snapshot.state.current_temperature(), Some(21.5));
    }

    #[test]
    fn expire_stale_disabled_by_default() {
        let bridge = announced_bridge(BridgeConfig::default());
        let far_future = Utc::now() + TimeDelta::days(365);
        assert!(bridge.expire_stale(far_future).is_empty());
    }

    #[test]
    fn transport_lost_marks_all_unavailable() {
        let bridge = announced_bridge(BridgeConfig::default());
        bridge.handle_message("tele/tasmota_2/LWT", b"Online");

        // Only the announced device reports
        let events = bridge.handle_transport_lost();
        assert_eq!(events.len(), 1);
        assert!(events[0].is_unavailable());
        assert!(bridge.devices().iter().all(|d| !d.state.available()));
        assert!(bridge.handle_transport_lost().is_empty());
    }

    // ========== Intents ==========

    #[test]
    fn prepare_intent_requires_known_device() {
        let bridge = Bridge::default();
        assert!(matches!(
            bridge.prepare_intent("tasmota_1", HvacIntent::SetMode(HvacMode::Cool)),
            Err(Error::DeviceNotFound)
        ));
    }

    #[test]
    fn prepare_intent_validates() {
        let bridge = announced_bridge(BridgeConfig::default());
        assert!(matches!(
            bridge.prepare_intent("tasmota_1", HvacIntent::SetTargetTemperature(40.0)),
            Err(Error::Validation(_))
        ));
        let msg = bridge
            .prepare_intent("tasmota_1", HvacIntent::SetFanSpeed(FanSpeed::Speed2))
            .unwrap();
        assert_eq!(msg, OutboundMessage::new("cmnd/tasmota_1/HVACSetFanSpeed", "2"));
    }

    #[tokio::test]
    async fn submit_intent_publishes_without_changing_state() {
        let bridge = announced_bridge(BridgeConfig::default());
        let sink = RecordingSink::default();

        bridge
            .submit_intent(&sink, "tasmota_1", HvacIntent::SetMode(HvacMode::Cool))
            .await
            .unwrap();

        assert_eq!(
            *sink.sent.lock(),
            vec![OutboundMessage::new("cmnd/tasmota_1/HVACSetHAMode", "cool")]
        );
        assert!(bridge.snapshot("tasmota_1").unwrap().state.mode().is_none());
    }

    #[tokio::test]
    async fn submit_intent_surfaces_delivery_error() {
        let bridge = announced_bridge(BridgeConfig::default());
        let result = bridge
            .submit_intent(&FailingSink, "tasmota_1", HvacIntent::SetMode(HvacMode::Cool))
            .await;
        assert!(matches!(result, Err(Error::Delivery(_))));
    }

    #[tokio::test]
    async fn submit_invalid_intent_never_reaches_sink() {
        let bridge = announced_bridge(BridgeConfig::default());
        let sink = RecordingSink::default();
        let result = bridge
            .submit_intent(&sink, "tasmota_1", HvacIntent::SetTargetTemperature(22.3))
            .await;
        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(sink.sent.lock().is_empty());
    }

    // ========== Removal ==========

    #[test]
    fn remove_device_retires_announced() {
        let bridge = announced_bridge(BridgeConfig::default());
        let mut rx = bridge.subscribe();

        let event = bridge.remove_device("tasmota_1").unwrap().unwrap();
        assert!(event.is_retired());
        assert!(rx.try_recv().unwrap().is_retired());
        assert!(bridge.devices().is_empty());
        assert!(matches!(
            bridge.remove_device("tasmota_1"),
            Err(Error::DeviceNotFound)
        ));
    }

    #[test]
    fn remove_provisional_device_is_silent() {
        let bridge = Bridge::default();
        bridge.handle_message("tele/tasmota_9/LWT", b"Online");
        assert!(bridge.remove_device("tasmota_9").unwrap().is_none());
    }

    // ========== Correlation ==========

    const DEN_TOPIC: &str = "tasmota/discovery/112233445566/config";

    fn count(events: &[LifecycleEvent], name: &str, pred: fn(&LifecycleEvent) -> bool) -> usize {
        events
            .iter()
            .filter(|e| pred(e) && e.snapshot().name() == name)
            .count()
    }

    #[test]
    fn rekey_onto_occupied_segment_retains_occupant() {
        let bridge = announced_bridge(BridgeConfig::default());
        bridge.handle_message(
            DEN_TOPIC,
            br#"{"mac":"112233445566","dn":"Den","t":"tasmota_2"}"#,
        );
        bridge.handle_message("tele/tasmota_2/LWT", b"Online");
        bridge.handle_message("tele/tasmota_2/SENSOR", SENSOR);

        // The first device moves onto the second one's segment
        let outcome = bridge.handle_message(
            DISCOVERY_TOPIC,
            br#"{"mac":"AABBCCDDEEFF","dn":"Hall","t":"tasmota_2"}"#,
        );
        assert!(!outcome.events.iter().any(LifecycleEvent::is_retired));
        let changed = outcome
            .events
            .iter()
            .find_map(LifecycleEvent::changed)
            .unwrap();
        assert!(changed.contains(ChangedField::TopicSegment));
        assert_eq!(count(&outcome.events, "Den", LifecycleEvent::is_unavailable), 1);
        assert_eq!(bridge.devices().len(), 1);

        // Still queryable by address, unavailable
        let den = HardwareAddress::new("112233445566").unwrap();
        let snapshot = bridge.snapshot_by_address(&den).unwrap();
        assert!(!snapshot.state.available());
        assert_eq!(snapshot.state.current_temperature(), Some(21.5));
    }

    #[test]
    fn swapped_topics_announce_each_address_once() {
        let bridge = announced_bridge(BridgeConfig::default());
        let mut all = Vec::new();
        for (topic, payload) in [
            (DEN_TOPIC, br#"{"mac":"112233445566","dn":"Den","t":"tasmota_2"}"#.as_slice()),
            ("tele/tasmota_2/SENSOR", SENSOR),
            (DISCOVERY_TOPIC, br#"{"mac":"AABBCCDDEEFF","dn":"Hall","t":"tasmota_2"}"#.as_slice()),
            (DEN_TOPIC, br#"{"mac":"112233445566","dn":"Den","t":"tasmota_1"}"#.as_slice()),
            ("tele/tasmota_1/SENSOR", br#"{"MiElHVAC":{"Temperature":19.0}}"#.as_slice()),
        ] {
            all.extend(bridge.handle_message(topic, payload).events);
        }

        assert_eq!(count(&all, "Den", LifecycleEvent::is_linkable), 1);
        assert_eq!(count(&all, "Hall", LifecycleEvent::is_linkable), 0);
        assert!(!all.iter().any(LifecycleEvent::is_retired));
        assert_eq!(bridge.devices().len(), 2);

        let den = bridge.snapshot("tasmota_1").unwrap();
        assert_eq!(den.name(), "Den");
        assert_eq!(den.state.current_temperature(), Some(19.0));
        assert_eq!(bridge.snapshot("tasmota_2").unwrap().name(), "Hall");
    }

    #[test]
    fn overwritten_address_returns_without_second_announcement() {
        let bridge = announced_bridge(BridgeConfig::default());
        let mut all = Vec::new();
        for (topic, payload) in [
            (DEN_TOPIC, br#"{"mac":"112233445566","dn":"Den","t":"tasmota_1"}"#.as_slice()),
            ("tele/tasmota_1/SENSOR", SENSOR),
            (DISCOVERY_TOPIC, br#"{"mac":"AABBCCDDEEFF","dn":"Hall","t":"tasmota_9"}"#.as_slice()),
            ("tele/tasmota_9/SENSOR", SENSOR),
        ] {
            all.extend(bridge.handle_message(topic, payload).events);
        }

        assert_eq!(count(&all, "Hall", LifecycleEvent::is_linkable), 0);
        assert_eq!(count(&all, "Hall", LifecycleEvent::is_unavailable), 1);
        assert_eq!(count(&all, "Den", LifecycleEvent::is_linkable), 1);
        assert!(!all.iter().any(LifecycleEvent::is_retired));

        let hall = HardwareAddress::new("AABBCCDDEEFF").unwrap();
        assert_eq!(bridge.snapshot_by_address(&hall).unwrap().topic_segment(), "tasmota_9");
        assert_eq!(bridge.devices().len(), 2);
    }
}
