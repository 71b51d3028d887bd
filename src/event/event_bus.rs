// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broadcast channel for lifecycle events.

use tokio::sync::broadcast;

use super::LifecycleEvent;

/// Default channel capacity for the event bus.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Fans lifecycle events out to any number of subscribers.
///
/// A subscriber that falls more than `capacity` events behind receives
/// `RecvError::Lagged` and skips the oldest events. Publishing never blocks
/// the inbound path.
///
/// # Examples
///
/// ```
/// use mielhvac_bridge::event::{EventBus, LifecycleEvent};
/// use mielhvac_bridge::registry::Device;
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.publish(LifecycleEvent::retired(Device::new("tasmota_1").snapshot()));
///
/// let event = rx.try_recv().unwrap();
/// assert!(event.is_retired());
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl EventBus {
    /// Creates a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Creates a new event bus buffering up to `capacity` events.
    ///
    /// A zero capacity is raised to one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event to all subscribers.
    ///
    /// Without subscribers the event is discarded.
    pub fn publish(&self, event: LifecycleEvent) {
        // No subscribers is not an error here
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Device;

    fn event(segment: &str) -> LifecycleEvent {
        LifecycleEvent::unavailable(Device::new(segment).snapshot())
    }

    #[tokio::test]
    async fn publish_delivers_to_multiple_subscribers() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(event("hp1"));

        assert_eq!(rx1.recv().await.unwrap().topic_segment(), "hp1");
        assert_eq!(rx2.recv().await.unwrap().topic_segment(), "hp1");
    }

    #[test]
    fn clone_shares_same_channel() {
        let bus1 = EventBus::with_capacity(8);
        let bus2 = bus1.clone();

        let mut rx = bus1.subscribe();
        bus2.publish(event("hp1"));
        assert_eq!(rx.try_recv().unwrap().topic_segment(), "hp1");
    }

    #[test]
    fn slow_subscriber_lags() {
        let bus = EventBus::with_capacity(2);
        let mut rx = bus.subscribe();
        for segment in ["a", "b", "c"] {
            bus.publish(event(segment));
        }
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(1))
        ));
        assert_eq!(rx.try_recv().unwrap().topic_segment(), "b");
    }
}
