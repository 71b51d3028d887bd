// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bridge configuration.

use std::time::Duration;

use crate::event::DEFAULT_EVENT_CAPACITY;
use crate::protocol::TopicScheme;
use crate::telemetry::DiscoveryMapping;

/// Key under which the MiElHVAC driver nests its `SENSOR` readings.
pub const DEFAULT_MODEL_KEY: &str = "MiElHVAC";

/// Configuration for a [`Bridge`](super::Bridge).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use mielhvac_bridge::manager::BridgeConfig;
/// use mielhvac_bridge::protocol::TopicScheme;
///
/// let config = BridgeConfig::default()
///     .with_topic_scheme(TopicScheme::default().with_discovery_prefix("tasmota/discovery"))
///     .with_stale_after(Duration::from_secs(600))
///     .with_status_requests(false);
///
/// assert_eq!(config.model_key, "MiElHVAC");
/// assert_eq!(config.stale_after, Some(Duration::from_secs(600)));
/// ```
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Topic prefixes and suffixes.
    pub topic_scheme: TopicScheme,
    /// Key of the sensor object in `SENSOR` payloads.
    pub model_key: String,
    /// How discovery payloads map to identity fields.
    pub discovery: DiscoveryMapping,
    /// Mark a device unavailable after this long without any message.
    /// `None` disables staleness.
    pub stale_after: Option<Duration>,
    /// Query `Status 1` for devices seen on telemetry without an address.
    pub request_status_on_unknown_address: bool,
    /// Buffer size of the event bus.
    pub event_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            topic_scheme: TopicScheme::default(),
            model_key: DEFAULT_MODEL_KEY.to_string(),
            discovery: DiscoveryMapping::default(),
            stale_after: None,
            request_status_on_unknown_address: true,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl BridgeConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the topic scheme.
    #[must_use]
    pub fn with_topic_scheme(mut self, scheme: TopicScheme) -> Self {
        self.topic_scheme = scheme;
        self
    }

    /// Sets the sensor model key (default: `MiElHVAC`).
    #[must_use]
    pub fn with_model_key(mut self, key: impl Into<String>) -> Self {
        self.model_key = key.into();
        self
    }

    /// Sets the discovery mapping.
    #[must_use]
    pub fn with_discovery_mapping(mut self, mapping: DiscoveryMapping) -> Self {
        self.discovery = mapping;
        self
    }

    /// Enables staleness with the given window.
    #[must_use]
    pub fn with_stale_after(mut self, window: Duration) -> Self {
        self.stale_after = Some(window);
        self
    }

    /// Enables or disables `Status 1` queries for unknown addresses.
    #[must_use]
    pub fn with_status_requests(mut self, enabled: bool) -> Self {
        self.request_status_on_unknown_address = enabled;
        self
    }

    /// Sets the event bus capacity.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}
