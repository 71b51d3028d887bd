// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Canonical climate state of one heat pump.

use serde::{Deserialize, Serialize};

use super::{ChangedField, ChangedFields};
use crate::telemetry::{SensorReading, SettingsRecord};
use crate::types::{
    FanSpeed, HvacAction, HvacMode, SwingHorizontal, SwingVertical, TargetTemperature,
};

/// Climate state of a heat pump.
///
/// Every field is independently optional; partial state is normal. Updates
/// only touch the fields present in their input and report which fields
/// actually changed, so re-applying the same record reports nothing.
///
/// # Examples
///
/// ```
/// use mielhvac_bridge::state::{ChangedField, ClimateState};
/// use mielhvac_bridge::telemetry::decode_settings;
///
/// let mut state = ClimateState::new();
/// let record = decode_settings(br#"{"HAMode":"heat","Temp":22}"#).unwrap();
///
/// let changed = state.apply_settings(&record);
/// assert!(changed.contains(ChangedField::Mode));
/// assert!(changed.contains(ChangedField::TargetTemperature));
///
/// // Same record again: nothing changes
/// assert!(state.apply_settings(&record).is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClimateState {
    mode: Option<HvacMode>,
    target_temperature: Option<TargetTemperature>,
    current_temperature: Option<f32>,
    fan_speed: Option<FanSpeed>,
    swing_vertical: Option<SwingVertical>,
    swing_horizontal: Option<SwingHorizontal>,
    available: bool,
}

impl ClimateState {
    /// Creates an empty, unavailable state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Accessors ==========

    /// Returns the operating mode.
    #[must_use]
    pub fn mode(&self) -> Option<HvacMode> {
        self.mode
    }

    /// Returns the action derived from the mode.
    #[must_use]
    pub fn hvac_action(&self) -> Option<HvacAction> {
        self.mode.as_ref().map(HvacMode::action)
    }

    /// Returns the setpoint.
    #[must_use]
    pub fn target_temperature(&self) -> Option<TargetTemperature> {
        self.target_temperature
    }

    /// Returns the room temperature in °C.
    #[must_use]
    pub fn current_temperature(&self) -> Option<f32> {
        self.current_temperature
    }

    /// Returns the fan speed.
    #[must_use]
    pub fn fan_speed(&self) -> Option<FanSpeed> {
        self.fan_speed
    }

    /// Returns the vertical vane position.
    #[must_use]
    pub fn swing_vertical(&self) -> Option<SwingVertical> {
        self.swing_vertical
    }

    /// Returns the horizontal vane position.
    #[must_use]
    pub fn swing_horizontal(&self) -> Option<SwingHorizontal> {
        self.swing_horizontal
    }

    /// Returns whether the device is available.
    #[must_use]
    pub fn available(&self) -> bool {
        self.available
    }

    /// Returns `true` once at least one settings field is known.
    #[must_use]
    pub fn is_operable(&self) -> bool {
        self.mode.is_some()
            || self.target_temperature.is_some()
            || self.fan_speed.is_some()
            || self.swing_vertical.is_some()
            || self.swing_horizontal.is_some()
    }

    /// Returns `true` once any climate field, including the room
    /// temperature, is known.
    #[must_use]
    pub fn has_climate_data(&self) -> bool {
        self.is_operable() || self.current_temperature.is_some()
    }

    // ========== State Changes ==========

    /// Applies a sensor reading.
    pub fn apply_sensor(&mut self, reading: &SensorReading) -> ChangedFields {
        let mut changed = ChangedFields::new();
        if merge(&mut self.current_temperature, reading.current_temperature) {
            changed.insert(ChangedField::CurrentTemperature);
        }
        changed
    }

    /// Applies a decoded settings record.
    ///
    /// Rejected fields in the record are not applied.
    pub fn apply_settings(&mut self, record: &SettingsRecord) -> ChangedFields {
        let mut changed = ChangedFields::new();
        if merge(&mut self.mode, record.mode) {
            changed.insert(ChangedField::Mode);
        }
        if merge(&mut self.target_temperature, record.target_temperature) {
            changed.insert(ChangedField::TargetTemperature);
        }
        if merge(&mut self.fan_speed, record.fan_speed) {
            changed.insert(ChangedField::FanSpeed);
        }
        if merge(&mut self.swing_vertical, record.swing_vertical) {
            changed.insert(ChangedField::SwingVertical);
        }
        if merge(&mut self.swing_horizontal, record.swing_horizontal) {
            changed.insert(ChangedField::SwingHorizontal);
        }
        changed
    }

    /// Sets the availability flag.
    pub fn apply_availability(&mut self, available: bool) -> ChangedFields {
        let mut changed = ChangedFields::new();
        if self.available != available {
            self.available = available;
            changed.insert(ChangedField::Available);
        }
        changed
    }

    /// Folds the known fields of `newer` into this state.
    ///
    /// Used when a provisional telemetry-only record is merged into a
    /// re-keyed device. Fields unknown in `newer` keep their value here;
    /// availability follows `newer`.
    pub fn absorb(&mut self, newer: &Self) -> ChangedFields {
        let mut changed = ChangedFields::new();
        if merge(&mut self.mode, newer.mode) {
            changed.insert(ChangedField::Mode);
        }
        if merge(&mut self.target_temperature, newer.target_temperature) {
            changed.insert(ChangedField::TargetTemperature);
        }
        if merge(&mut self.current_temperature, newer.current_temperature) {
            changed.insert(ChangedField::CurrentTemperature);
        }
        if merge(&mut self.fan_speed, newer.fan_speed) {
            changed.insert(ChangedField::FanSpeed);
        }
        if merge(&mut self.swing_vertical, newer.swing_vertical) {
            changed.insert(ChangedField::SwingVertical);
        }
        if merge(&mut self.swing_horizontal, newer.swing_horizontal) {
            changed.insert(ChangedField::SwingHorizontal);
        }
        changed.merge(&self.apply_availability(newer.available));
        changed
    }
}

/// Stores `value` if present and different; returns whether it changed.
fn merge<T: PartialEq + Copy>(slot: &mut Option<T>, value: Option<T>) -> bool {
    match value {
        Some(v) if *slot != Some(v) => {
            *slot = Some(v);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::decode_settings;

    fn settings(json: &str) -> SettingsRecord {
        decode_settings(json.as_bytes()).unwrap()
    }

    fn sensor(celsius: f32) -> SensorReading {
        SensorReading {
            current_temperature: Some(celsius),
        }
    }

    #[test]
    fn new_state_is_empty_and_unavailable() {
        let state = ClimateState::new();
        assert!(state.mode().is_none());
        assert!(state.current_temperature().is_none());
        assert!(!state.available());
        assert!(!state.is_operable());
        assert!(!state.has_climate_data());
    }

    #[test]
    fn partial_settings_touch_only_present_fields() {
        let mut state = ClimateState::new();
        state.apply_settings(&settings(
            r#"{"HAMode":"cool","Temp":24,"FanSpeed":"quiet","SwingV":"down","SwingH":"left"}"#,
        ));
        let before = state.clone();

        let changed = state.apply_settings(&settings(r#"{"FanSpeed":"4"}"#));
        assert_eq!(changed.iter().collect::<Vec<_>>(), vec![ChangedField::FanSpeed]);
        assert_eq!(state.fan_speed(), Some(FanSpeed::Speed4));
        assert_eq!(state.mode(), before.mode());
        assert_eq!(state.target_temperature(), before.target_temperature());
        assert_eq!(state.swing_vertical(), before.swing_vertical());
        assert_eq!(state.swing_horizontal(), before.swing_horizontal());
    }

    #[test]
    fn identical_settings_are_idempotent() {
        let mut state = ClimateState::new();
        let record = settings(r#"{"HAMode":"dry","SwingH":"swing"}"#);
        assert_eq!(state.apply_settings(&record).len(), 2);
        assert!(state.apply_settings(&record).is_empty());
    }

    #[test]
    fn rejected_fields_are_not_applied() {
        let mut state = ClimateState::new();
        state.apply_settings(&settings(r#"{"Temp":21}"#));
        let changed = state.apply_settings(&settings(r#"{"Temp":99,"HAMode":"heat"}"#));
        assert_eq!(changed.iter().collect::<Vec<_>>(), vec![ChangedField::Mode]);
        assert_eq!(state.target_temperature(), TargetTemperature::new(21.0).ok());
    }

    #[test]
    fn sensor_updates_current_temperature_only() {
        let mut state = ClimateState::new();
        state.apply_settings(&settings(r#"{"HAMode":"heat"}"#));
        let changed = state.apply_sensor(&sensor(21.5));
        assert!(changed.contains(ChangedField::CurrentTemperature));
        assert_eq!(changed.len(), 1);
        assert_eq!(state.mode(), Some(HvacMode::Heat));
        assert!(state.apply_sensor(&sensor(21.5)).is_empty());
        assert!(state.apply_sensor(&SensorReading::default()).is_empty());
        assert_eq!(state.current_temperature(), Some(21.5));
    }

    #[test]
    fn sensor_and_settings_commute() {
        let record = settings(r#"{"HAMode":"auto","Temp":20.5}"#);
        let reading = sensor(19.0);

        let mut a = ClimateState::new();
        a.apply_sensor(&reading);
        a.apply_settings(&record);

        let mut b = ClimateState::new();
        b.apply_settings(&record);
        b.apply_sensor(&reading);

        assert_eq!(a, b);
    }

    #[test]
    fn availability_toggles_without_touching_state() {
        let mut state = ClimateState::new();
        state.apply_settings(&settings(r#"{"HAMode":"heat","Temp":22}"#));
        let snapshot = state.clone();

        assert!(state.apply_availability(true).contains(ChangedField::Available));
        assert!(state.apply_availability(true).is_empty());
        assert!(state.apply_availability(false).contains(ChangedField::Available));
        assert_eq!(state.mode(), snapshot.mode());
        assert_eq!(state.target_temperature(), snapshot.target_temperature());
    }

    #[test]
    fn hvac_action_follows_mode() {
        let mut state = ClimateState::new();
        assert!(state.hvac_action().is_none());
        state.apply_settings(&settings(r#"{"HAMode":"fan_only"}"#));
        assert_eq!(state.hvac_action(), Some(HvacAction::Fan));
    }

    #[test]
    fn operable_vs_climate_data() {
        let mut state = ClimateState::new();
        state.apply_sensor(&sensor(20.0));
        assert!(state.has_climate_data());
        assert!(!state.is_operable());
    }

    #[test]
    fn absorb_prefers_newer_known_fields() {
        let mut old = ClimateState::new();
        old.apply_settings(&settings(r#"{"HAMode":"cool","Temp":24}"#));
        old.apply_availability(true);

        let mut newer = ClimateState::new();
        newer.apply_settings(&settings(r#"{"HAMode":"heat"}"#));
        newer.apply_sensor(&sensor(18.5));
        newer.apply_availability(true);

        let changed = old.absorb(&newer);
        assert_eq!(old.mode(), Some(HvacMode::Heat));
        assert_eq!(old.target_temperature(), TargetTemperature::new(24.0).ok());
        assert_eq!(old.current_temperature(), Some(18.5));
        assert!(changed.contains(ChangedField::Mode));
        assert!(changed.contains(ChangedField::CurrentTemperature));
        assert!(!changed.contains(ChangedField::TargetTemperature));
        assert!(!changed.contains(ChangedField::Available));
    }

    #[test]
    fn serde_round_trip_keeps_tokens() {
        let mut state = ClimateState::new();
        state.apply_settings(&settings(r#"{"HAMode":"fan_only","FanSpeed":"1"}"#));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["mode"], "fan_only");
        assert_eq!(json["fan_speed"], "1");
        let back: ClimateState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
