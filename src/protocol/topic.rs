// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topic classification and rendering.
//!
//! The [`TopicScheme`] classifies incoming topics into the handful of kinds
//! the bridge cares about and renders the subscription filters and command
//! topics for a device. Everything else on the bus is
//! [`TopicKind::Unrecognized`].
//!
//! # Grammar
//!
//! ```text
//! tele/<segment>/LWT                      → Availability
//! tele/<segment>/SENSOR                   → Sensor
//! tele/<segment>/HVACSETTINGS             → Settings
//! stat/<segment>/STATUS1                  → Status
//! tasmota/discovery/<identifier>/config   → Discovery
//! cmnd/<segment>/<Command>                → outbound only
//! ```

use crate::error::ValidationError;

/// Subtopic carrying the last-will availability token.
pub const LWT_SUBTOPIC: &str = "LWT";
/// Subtopic carrying sensor telemetry.
pub const SENSOR_SUBTOPIC: &str = "SENSOR";
/// Subtopic carrying heat pump settings.
pub const SETTINGS_SUBTOPIC: &str = "HVACSETTINGS";
/// Subtopic carrying the network status reply.
pub const STATUS_SUBTOPIC: &str = "STATUS1";

/// Classification of an inbound topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicKind {
    /// A discovery announcement; `identifier` is the level between the
    /// discovery prefix and suffix.
    Discovery {
        /// The routable identifier embedded in the topic.
        identifier: String,
    },
    /// Last-will availability token.
    Availability {
        /// The device topic segment.
        segment: String,
    },
    /// Sensor telemetry.
    Sensor {
        /// The device topic segment.
        segment: String,
    },
    /// Heat pump settings telemetry.
    Settings {
        /// The device topic segment.
        segment: String,
    },
    /// Network status reply, used to learn the hardware address.
    Status {
        /// The device topic segment.
        segment: String,
    },
    /// Anything else on the bus.
    Unrecognized,
}

impl TopicKind {
    /// Returns the device topic segment for telemetry kinds.
    #[must_use]
    pub fn segment(&self) -> Option<&str> {
        match self {
            Self::Availability { segment }
            | Self::Sensor { segment }
            | Self::Settings { segment }
            | Self::Status { segment } => Some(segment),
            Self::Discovery { .. } | Self::Unrecognized => None,
        }
    }

    /// Returns `true` if the topic is not one the bridge handles.
    #[must_use]
    pub fn is_unrecognized(&self) -> bool {
        matches!(self, Self::Unrecognized)
    }
}

/// Topic prefixes used by the firmware.
///
/// The defaults match a stock Tasmota `FullTopic` of `%prefix%/%topic%/`.
///
/// # Examples
///
/// ```
/// use mielhvac_bridge::protocol::{TopicKind, TopicScheme};
///
/// let scheme = TopicScheme::default();
/// assert_eq!(
///     scheme.classify("tele/tasmota_1/SENSOR"),
///     TopicKind::Sensor { segment: "tasmota_1".to_string() }
/// );
/// assert_eq!(scheme.classify("cmnd/tasmota_1/Power"), TopicKind::Unrecognized);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicScheme {
    telemetry_prefix: String,
    stat_prefix: String,
    command_prefix: String,
    discovery_prefix: String,
    discovery_suffix: String,
}

impl Default for TopicScheme {
    fn default() -> Self {
        Self {
            telemetry_prefix: "tele".to_string(),
            stat_prefix: "stat".to_string(),
            command_prefix: "cmnd".to_string(),
            discovery_prefix: "tasmota/discovery".to_string(),
            discovery_suffix: "config".to_string(),
        }
    }
}

impl TopicScheme {
    /// Creates the default scheme.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the telemetry prefix (default: `tele`).
    #[must_use]
    pub fn with_telemetry_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.telemetry_prefix = prefix.into();
        self
    }

    /// Sets the status prefix (default: `stat`).
    #[must_use]
    pub fn with_stat_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.stat_prefix = prefix.into();
        self
    }

    /// Sets the command prefix (default: `cmnd`).
    #[must_use]
    pub fn with_command_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.command_prefix = prefix.into();
        self
    }

    /// Sets the discovery prefix (default: `tasmota/discovery`).
    #[must_use]
    pub fn with_discovery_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.discovery_prefix = prefix.into();
        self
    }

    /// Sets the discovery suffix (default: `config`).
    #[must_use]
    pub fn with_discovery_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.discovery_suffix = suffix.into();
        self
    }

    /// Returns the command prefix.
    #[must_use]
    pub fn command_prefix(&self) -> &str {
        &self.command_prefix
    }

    /// Classifies a topic.
    ///
    /// Segments must be exactly one non-empty level. Command topics are
    /// outbound only and classify as [`TopicKind::Unrecognized`].
    #[must_use]
    pub fn classify(&self, topic: &str) -> TopicKind {
        if let Some(identifier) = self.match_discovery(topic) {
            return TopicKind::Discovery {
                identifier: identifier.to_string(),
            };
        }

        if let Some(parsed) = ParsedTopic::parse(topic, &self.telemetry_prefix) {
            let segment = parsed.segment.to_string();
            return match parsed.subtopic {
                LWT_SUBTOPIC => TopicKind::Availability { segment },
                SENSOR_SUBTOPIC => TopicKind::Sensor { segment },
                SETTINGS_SUBTOPIC => TopicKind::Settings { segment },
                _ => TopicKind::Unrecognized,
            };
        }

        if let Some(parsed) = ParsedTopic::parse(topic, &self.stat_prefix)
            && parsed.subtopic == STATUS_SUBTOPIC
        {
            return TopicKind::Status {
                segment: parsed.segment.to_string(),
            };
        }

        TopicKind::Unrecognized
    }

    /// Returns the five subscription filters the bridge needs.
    #[must_use]
    pub fn subscription_filters(&self) -> Vec<String> {
        vec![
            format!("{}/+/{}", self.discovery_prefix, self.discovery_suffix),
            format!("{}/+/{LWT_SUBTOPIC}", self.telemetry_prefix),
            format!("{}/+/{SENSOR_SUBTOPIC}", self.telemetry_prefix),
            format!("{}/+/{SETTINGS_SUBTOPIC}", self.telemetry_prefix),
            format!("{}/+/{STATUS_SUBTOPIC}", self.stat_prefix),
        ]
    }

    /// Renders `cmnd/<segment>/<command>`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidSegment` if the segment is empty or
    /// contains `/`, `+` or `#`.
    pub fn command_topic(&self, segment: &str, command: &str) -> Result<String, ValidationError> {
        validate_segment(segment)?;
        Ok(format!("{}/{segment}/{command}", self.command_prefix))
    }

    fn match_discovery<'a>(&self, topic: &'a str) -> Option<&'a str> {
        let rest = topic
            .strip_prefix(self.discovery_prefix.as_str())?
            .strip_prefix('/')?;
        let identifier = rest
            .strip_suffix(self.discovery_suffix.as_str())?
            .strip_suffix('/')?;
        is_single_level(identifier).then_some(identifier)
    }
}

/// Checks that a segment can be embedded in a topic as one level.
///
/// # Errors
///
/// Returns `ValidationError::InvalidSegment` if the segment is empty or
/// contains a level separator or wildcard.
pub fn validate_segment(segment: &str) -> Result<(), ValidationError> {
    if segment.is_empty() || segment.contains(['/', '+', '#']) {
        return Err(ValidationError::InvalidSegment(segment.to_string()));
    }
    Ok(())
}

fn is_single_level(level: &str) -> bool {
    !level.is_empty() && !level.contains('/')
}

/// Parsed `prefix/segment/subtopic` topic.
#[derive(Debug)]
struct ParsedTopic<'a> {
    /// The device topic (e.g., `tasmota_bedroom`).
    segment: &'a str,
    /// The subtopic (e.g., `SENSOR`, `LWT`).
    subtopic: &'a str,
}

impl<'a> ParsedTopic<'a> {
    /// Parses a topic under `prefix`.
    ///
    /// The prefix may span several levels; the segment and subtopic are
    /// exactly one level each.
    fn parse(topic: &'a str, prefix: &str) -> Option<Self> {
        let rest = topic.strip_prefix(prefix)?.strip_prefix('/')?;
        let (segment, subtopic) = rest.split_once('/')?;
        if !is_single_level(segment) || !is_single_level(subtopic) {
            return None;
        }
        Some(Self { segment, subtopic })
    }
}
