// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT broker connection driving a [`Bridge`].
//!
//! The connection subscribes to the discovery and telemetry filters on
//! every (re)connect, feeds each received message to
//! [`Bridge::handle_message`], publishes the follow-up requests it returns
//! and marks devices unavailable when the connection drops.
//!
//! # Examples
//!
//! ```no_run
//! use std::time::Duration;
//! use mielhvac_bridge::command::HvacIntent;
//! use mielhvac_bridge::manager::BridgeConfig;
//! use mielhvac_bridge::protocol::MqttBridge;
//! use mielhvac_bridge::types::HvacMode;
//!
//! # async fn example() -> mielhvac_bridge::Result<()> {
//! let mqtt = MqttBridge::builder()
//!     .host("192.168.1.50")
//!     .port(1883)
//!     .credentials("user", "password")
//!     .bridge_config(BridgeConfig::default().with_stale_after(Duration::from_secs(600)))
//!     .build()
//!     .await?;
//!
//! let mut events = mqtt.subscribe();
//! while let Ok(event) = events.recv().await {
//!     if event.is_linkable() {
//!         mqtt.submit_intent(event.topic_segment(), HvacIntent::SetMode(HvacMode::Heat))
//!             .await?;
//!     }
//! }
//!
//! mqtt.disconnect().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use tokio::sync::{broadcast, oneshot};

use crate::command::{HvacIntent, OutboundMessage};
use crate::error::{DeliveryError, Result};
use crate::event::LifecycleEvent;
use crate::manager::{Bridge, BridgeConfig};
use crate::protocol::CommandSink;

/// Global counter for generating unique client IDs.
static CLIENT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Capacity of the client request channel.
const REQUEST_CHANNEL_CAPACITY: usize = 32;

/// Configuration for an MQTT bridge connection.
#[derive(Debug, Clone)]
struct MqttBridgeConfig {
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
    keep_alive: Duration,
    connection_timeout: Duration,
    reconnect_delay: Duration,
    sweep_interval: Duration,
}

impl Default for MqttBridgeConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 1883,
            credentials: None,
            keep_alive: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
            reconnect_delay: Duration::from_secs(5),
            sweep_interval: Duration::from_secs(30),
        }
    }
}

/// A broker connection feeding a [`Bridge`].
///
/// Cheaply cloneable; clones share the connection and the bridge.
#[derive(Clone)]
pub struct MqttBridge {
    inner: Arc<MqttBridgeInner>,
}

struct MqttBridgeInner {
    client: AsyncClient,
    bridge: Arc<Bridge>,
    config: MqttBridgeConfig,
    connected: AtomicBool,
    shutdown: AtomicBool,
}

impl MqttBridge {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> MqttBridgeBuilder {
        MqttBridgeBuilder::default()
    }

    /// Returns the bridge engine.
    #[must_use]
    pub fn bridge(&self) -> &Arc<Bridge> {
        &self.inner.bridge
    }

    /// Returns whether the broker connection is up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    /// Returns the host address of the broker.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.inner.config.host
    }

    /// Returns the port of the broker.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.inner.config.port
    }

    /// Subscribes to lifecycle events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.inner.bridge.subscribe()
    }

    /// Validates `intent` and publishes it to the device at `segment`.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound`, `Error::Validation` or
    /// `Error::Delivery`.
    pub async fn submit_intent(&self, segment: &str, intent: HvacIntent) -> Result<()> {
        self.inner.bridge.submit_intent(self, segment, intent).await
    }

    /// Disconnects from the broker and stops processing messages.
    ///
    /// # Errors
    ///
    /// Returns error if the disconnect request cannot be queued.
    pub async fn disconnect(&self) -> std::result::Result<(), DeliveryError> {
        tracing::info!(
            host = %self.inner.config.host,
            port = %self.inner.config.port,
            "Disconnecting from MQTT broker"
        );
        self.inner.shutdown.store(true, Ordering::Release);
        self.inner.client.disconnect().await?;
        self.inner.connected.store(false, Ordering::Release);
        Ok(())
    }

    fn is_shut_down(&self) -> bool {
        self.inner.shutdown.load(Ordering::Acquire)
    }

    /// Queues the discovery and telemetry subscriptions.
    fn subscribe_filters(&self) {
        for filter in self.inner.bridge.config().topic_scheme.subscription_filters() {
            match self.inner.client.try_subscribe(filter.as_str(), QoS::AtLeastOnce) {
                Ok(()) => tracing::debug!(filter = %filter, "Subscribing"),
                Err(e) => tracing::error!(filter = %filter, error = %e, "Failed to subscribe"),
            }
        }
    }

    /// Runs one inbound message through the bridge and queues follow-ups.
    fn dispatch(&self, topic: &str, payload: &[u8]) {
        tracing::trace!(topic = %topic, bytes = payload.len(), "MQTT message received");
        let outcome = self.inner.bridge.handle_message(topic, payload);
        for message in outcome.follow_ups {
            if let Err(e) = self.inner.client.try_publish(
                message.topic.as_str(),
                QoS::AtLeastOnce,
                false,
                message.payload.into_bytes(),
            ) {
                tracing::warn!(topic = %message.topic, error = %e, "Failed to queue follow-up");
            }
        }
    }

    fn connection_lost(&self) {
        if self.inner.connected.swap(false, Ordering::AcqRel) {
            self.inner.bridge.handle_transport_lost();
        }
    }
}

impl CommandSink for MqttBridge {
    async fn publish(&self, message: &OutboundMessage) -> std::result::Result<(), DeliveryError> {
        if self.is_shut_down() {
            return Err(DeliveryError::ChannelClosed(
                "bridge disconnected".to_string(),
            ));
        }
        self.inner
            .client
            .publish(
                message.topic.as_str(),
                QoS::AtLeastOnce,
                false,
                message.payload.clone().into_bytes(),
            )
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for MqttBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttBridge")
            .field("host", &self.inner.config.host)
            .field("port", &self.inner.config.port)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

/// Builder for an [`MqttBridge`].
#[derive(Debug, Default)]
pub struct MqttBridgeBuilder {
    config: MqttBridgeConfig,
    bridge: Option<Arc<Bridge>>,
    bridge_config: BridgeConfig,
}

impl MqttBridgeBuilder {
    /// Sets the broker host address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the broker port (default: 1883).
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets authentication credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the keep-alive interval (default: 30 seconds).
    #[must_use]
    pub fn keep_alive(mut self, duration: Duration) -> Self {
        self.config.keep_alive = duration;
        self
    }

    /// Sets the connection timeout (default: 10 seconds).
    #[must_use]
    pub fn connection_timeout(mut self, duration: Duration) -> Self {
        self.config.connection_timeout = duration;
        self
    }

    /// Sets the pause before reconnecting after a failure (default: 5 seconds).
    #[must_use]
    pub fn reconnect_delay(mut self, duration: Duration) -> Self {
        self.config.reconnect_delay = duration;
        self
    }

    /// Sets how often staleness is checked (default: 30 seconds).
    ///
    /// Only used when the bridge configuration enables staleness.
    #[must_use]
    pub fn sweep_interval(mut self, duration: Duration) -> Self {
        self.config.sweep_interval = duration;
        self
    }

    /// Sets the configuration of the bridge created by [`build`](Self::build).
    #[must_use]
    pub fn bridge_config(mut self, config: BridgeConfig) -> Self {
        self.bridge_config = config;
        self
    }

    /// Uses an existing bridge instead of creating one.
    #[must_use]
    pub fn bridge(mut self, bridge: Arc<Bridge>) -> Self {
        self.bridge = Some(bridge);
        self
    }

    /// Connects to the broker and starts processing messages.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Host is not set
    /// - Connection fails
    /// - Connection times out
    pub async fn build(self) -> std::result::Result<MqttBridge, DeliveryError> {
        if self.config.host.is_empty() {
            return Err(DeliveryError::InvalidAddress(
                "MQTT broker host is required".to_string(),
            ));
        }

        let counter = CLIENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        let client_id = format!("mielhvac_{}_{}", std::process::id(), counter);

        let mut mqtt_options = MqttOptions::new(&client_id, &self.config.host, self.config.port);
        mqtt_options.set_keep_alive(self.config.keep_alive);
        mqtt_options.set_clean_session(true);

        if let Some((ref username, ref password)) = self.config.credentials {
            mqtt_options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, REQUEST_CHANNEL_CAPACITY);

        let bridge = self
            .bridge
            .unwrap_or_else(|| Arc::new(Bridge::new(self.bridge_config)));

        let mqtt = MqttBridge {
            inner: Arc::new(MqttBridgeInner {
                client,
                bridge,
                config: self.config.clone(),
                connected: AtomicBool::new(false),
                shutdown: AtomicBool::new(false),
            }),
        };

        let (connack_tx, connack_rx) = oneshot::channel();

        let mqtt_clone = mqtt.clone();
        tokio::spawn(async move {
            handle_bridge_events(event_loop, mqtt_clone, connack_tx).await;
        });

        let timeout = self.config.connection_timeout;
        match tokio::time::timeout(timeout, connack_rx).await {
            Ok(Ok(())) => {
                tracing::info!(
                    host = %self.config.host,
                    port = %self.config.port,
                    client_id = %client_id,
                    "Connected to MQTT broker"
                );
            }
            Ok(Err(_)) => {
                mqtt.inner.shutdown.store(true, Ordering::Release);
                return Err(DeliveryError::ConnectionFailed(
                    "MQTT event loop terminated unexpectedly".to_string(),
                ));
            }
            Err(_) => {
                mqtt.inner.shutdown.store(true, Ordering::Release);
                return Err(DeliveryError::ConnectionFailed(format!(
                    "MQTT connection timeout after {}s",
                    timeout.as_secs()
                )));
            }
        }

        if mqtt.inner.bridge.config().stale_after.is_some() {
            let sweeper = mqtt.clone();
            tokio::spawn(async move {
                run_stale_sweep(sweeper).await;
            });
        }

        Ok(mqtt)
    }
}

/// Handles MQTT events for the bridge connection.
///
/// Polling after an error lets the event loop reconnect; subscriptions are
/// queued again on every ConnAck because the session is clean.
async fn handle_bridge_events(
    mut event_loop: EventLoop,
    mqtt: MqttBridge,
    connack_tx: oneshot::Sender<()>,
) {
    let mut connack_tx = Some(connack_tx);

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "MQTT broker connected");
                mqtt.inner.connected.store(true, Ordering::Release);
                mqtt.subscribe_filters();
                if let Some(tx) = connack_tx.take() {
                    let _ = tx.send(());
                }
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(?suback, "MQTT subscription acknowledged");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                if mqtt.is_shut_down() {
                    continue;
                }
                mqtt.dispatch(&publish.topic, &publish.payload);
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::info!("MQTT broker disconnected");
                mqtt.connection_lost();
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                tracing::debug!("MQTT disconnect sent");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                if mqtt.is_shut_down() {
                    break;
                }
                tracing::error!(error = %e, "MQTT broker event loop error");
                mqtt.connection_lost();
                // Before the first ConnAck the builder reports the failure
                if connack_tx.is_some() {
                    break;
                }
                tokio::time::sleep(mqtt.inner.config.reconnect_delay).await;
            }
        }
    }
    mqtt.inner.connected.store(false, Ordering::Release);
    tracing::debug!("MQTT event loop stopped");
}

/// Periodically marks silent devices unavailable.
async fn run_stale_sweep(mqtt: MqttBridge) {
    let mut interval = tokio::time::interval(mqtt.inner.config.sweep_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        if mqtt.is_shut_down() {
            break;
        }
        let events = mqtt.inner.bridge.expire_stale(Utc::now());
        if !events.is_empty() {
            tracing::debug!(count = events.len(), "Stale devices marked unavailable");
        }
    }
}
