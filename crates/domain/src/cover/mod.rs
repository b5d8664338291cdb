//! The cover macro: shading devices driven by buttons, sensors, and time.
//!
//! Split by concern: [`settings`] is the immutable configuration shape,
//! [`state`] the persisted snapshot, [`aggregate`] the per-category sensor
//! fusion, [`engine`] the pure priority rule chain. [`CoverMacro`] wires
//! them into the [`MacroLogic`] lifecycle: inbound control values mutate
//! state synchronously, `compute_output` runs the chain and realizes the
//! decision as device commands.

pub mod aggregate;
pub mod engine;
pub mod settings;
pub mod state;

use serde::Deserialize;
use serde_json::Value;

use crate::control::{Command, ControlPayload, ControlRef, ControlValue};
use crate::cover::aggregate::SensorBank;
use crate::cover::engine::{CoverCommand, Decision, ManualIntent};
use crate::cover::settings::CoverSettings;
use crate::cover::state::CoverState;
use crate::error::{MacroHubError, MalformedState};
use crate::macros::{MacroLogic, MacroOutput};
use crate::migration::{parse_versioned, MigrationStep};
use crate::showcase::MacroKind;
use crate::time::Timestamp;

/// Output of one cover cycle: at most one state command and one position
/// command.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverOutput {
    pub state: Option<Command>,
    pub position: Option<Command>,
}

impl MacroOutput for CoverOutput {
    fn commands(&self) -> Vec<Command> {
        self.state
            .iter()
            .chain(self.position.iter())
            .cloned()
            .collect()
    }
}

/// Version 0 settings stored `open_close_by_time` as a single optional
/// schedule object; version 1 holds a list.
fn expand_single_schedule(mut value: Value) -> Result<Value, String> {
    let object = value
        .as_object_mut()
        .ok_or("settings payload is not an object")?;
    let schedules = match object.remove("open_close_by_time") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => entries,
        Some(single) => vec![single],
    };
    object.insert("open_close_by_time".to_string(), Value::Array(schedules));
    Ok(value)
}

const MIGRATIONS: &[MigrationStep] = &[expand_single_schedule];

/// A user-initiated change to the public projection.
#[derive(Debug, Deserialize)]
struct PublicUpdate {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    position: Option<f64>,
}

/// One configured cover instance.
pub struct CoverMacro {
    settings: CoverSettings,
    state: CoverState,
    illuminations: SensorBank,
    motions: SensorBank,
    noises: SensorBank,
    temperatures: SensorBank,
    pending_manual: Option<ManualIntent>,
}

impl CoverMacro {
    fn command(reference: &ControlRef, payload: ControlPayload) -> Command {
        Command {
            device_id: reference.device_id.clone(),
            control_id: reference.control_id.clone(),
            control_type: reference.control_type,
            payload,
        }
    }

    /// Map a normalized position (100 = open) onto device units, clamped to
    /// the device's endpoint range. `position.open > position.close` means
    /// the device counts inverted; the linear map handles both.
    fn to_device_position(&self, normalized: f64) -> f64 {
        let open = self.settings.position.open;
        let close = self.settings.position.close;
        let raw = close + (open - close) * normalized / 100.0;
        raw.clamp(open.min(close), open.max(close))
    }

    /// Inverse of [`to_device_position`](Self::to_device_position), for
    /// position feedback reported by the device.
    fn from_device_position(&self, device: f64) -> f64 {
        let open = self.settings.position.open;
        let close = self.settings.position.close;
        let span = open - close;
        if span.abs() < f64::EPSILON {
            return self.state.position;
        }
        ((device - close) / span * 100.0).clamp(0.0, 100.0)
    }

    /// Restart or clear the quiet stretch after a motion or noise update.
    fn refresh_calm(&mut self, at: Timestamp) {
        let occupied = self.state.motion > self.settings.motion.trigger
            || self.state.noise > self.settings.noise.trigger;
        if occupied {
            self.state.calm_since = None;
        } else if self.state.calm_since.is_none() {
            self.state.calm_since = Some(at);
        }
    }

    fn apply_switcher(&mut self, value: &ControlValue) -> bool {
        let Some(level) = value.payload.as_switch() else {
            return false;
        };
        let Some(switcher) = self
            .settings
            .switchers
            .iter()
            .find(|switcher| switcher.control.matches(value))
        else {
            return false;
        };
        if self.state.switch == level {
            return false;
        }
        self.state.switch = level;
        if level == switcher.trigger.firing_level() {
            self.pending_manual = Some(ManualIntent::Press);
        }
        true
    }

    /// Update the public projection and build the commands for a decision.
    fn realize(&mut self, decision: Decision) -> CoverOutput {
        match decision {
            Decision::State(command) => {
                let value = match command {
                    CoverCommand::Open => {
                        self.state.position = 100.0;
                        self.settings.state.open.clone()
                    }
                    CoverCommand::Close => {
                        self.state.position = 0.0;
                        self.settings.state.close.clone()
                    }
                    CoverCommand::Stop => self.settings.state.stop.clone(),
                };
                self.state.state.clone_from(&value);
                CoverOutput {
                    state: Some(Self::command(
                        &self.settings.state.control,
                        ControlPayload::Discrete(value),
                    )),
                    position: None,
                }
            }
            Decision::Position(target) => {
                let target = target.clamp(0.0, 100.0);
                self.state.position = target;
                CoverOutput {
                    state: None,
                    position: Some(Self::command(
                        &self.settings.position.control,
                        ControlPayload::Analog(self.to_device_position(target)),
                    )),
                }
            }
        }
    }
}

impl MacroLogic for CoverMacro {
    type Settings = CoverSettings;
    type State = CoverState;
    type Output = CoverOutput;

    const KIND: MacroKind = MacroKind::Cover;
    const VERSION: u32 = 1;

    fn parse_settings(raw: &str, from_version: u32) -> Result<CoverSettings, MacroHubError> {
        let settings: CoverSettings =
            parse_versioned(raw, from_version, Self::VERSION, MIGRATIONS)?;
        settings.validate()?;
        Ok(settings)
    }

    fn parse_state(raw: Option<&str>) -> CoverState {
        let Some(raw) = raw else {
            return CoverState::default();
        };
        match serde_json::from_str(raw) {
            Ok(state) => state,
            Err(err) => {
                let err = MalformedState::Decode(err);
                tracing::warn!(%err, "malformed cover state snapshot, using the default");
                CoverState::default()
            }
        }
    }

    fn new(settings: CoverSettings, state: CoverState) -> Self {
        Self {
            settings,
            state,
            illuminations: SensorBank::default(),
            motions: SensorBank::default(),
            noises: SensorBank::default(),
            temperatures: SensorBank::default(),
            pending_manual: None,
        }
    }

    fn state(&self) -> &CoverState {
        &self.state
    }

    fn subscriptions(&self) -> Vec<ControlRef> {
        self.settings.subscriptions()
    }

    fn apply_public_state(&mut self, update: &Value, _now: Timestamp) -> bool {
        let Ok(update) = serde_json::from_value::<PublicUpdate>(update.clone()) else {
            return false;
        };
        if let Some(state) = update.state {
            let command = if state == self.settings.state.open {
                CoverCommand::Open
            } else if state == self.settings.state.close {
                CoverCommand::Close
            } else if state == self.settings.state.stop {
                CoverCommand::Stop
            } else {
                return false;
            };
            self.pending_manual = Some(ManualIntent::Explicit(Decision::State(command)));
            return true;
        }
        if let Some(position) = update.position {
            if !(0.0..=100.0).contains(&position) {
                return false;
            }
            self.pending_manual = Some(ManualIntent::Explicit(Decision::Position(position)));
            return true;
        }
        false
    }

    fn apply_external_value(&mut self, value: &ControlValue) -> bool {
        if self.apply_switcher(value) {
            return true;
        }
        if self.settings.illuminations.iter().any(|r| r.matches(value)) {
            let changed = self.illuminations.record(value);
            self.state.illumination =
                self.illuminations.aggregate(self.settings.illumination.detection);
            return changed;
        }
        if self.settings.motions.iter().any(|r| r.matches(value)) {
            let changed = self.motions.record(value);
            self.state.motion = self.motions.aggregate(self.settings.motion.detection);
            self.refresh_calm(value.timestamp);
            return changed;
        }
        if self.settings.noises.iter().any(|r| r.matches(value)) {
            let changed = self.noises.record(value);
            self.state.noise = self.noises.aggregate(self.settings.noise.detection);
            self.refresh_calm(value.timestamp);
            return changed;
        }
        if self.settings.temperatures.iter().any(|r| r.matches(value)) {
            let changed = self.temperatures.record(value);
            self.state.temperature =
                self.temperatures.aggregate(self.settings.temperature.detection);
            return changed;
        }
        if self.settings.state.control.matches(value) {
            if let ControlPayload::Discrete(reported) = &value.payload {
                if self.state.state != *reported {
                    self.state.state.clone_from(reported);
                    return true;
                }
            }
            return false;
        }
        if self.settings.position.control.matches(value) {
            if let Some(device) = value.payload.as_analog() {
                let normalized = self.from_device_position(device);
                if (normalized - self.state.position).abs() > f64::EPSILON {
                    self.state.position = normalized;
                    return true;
                }
            }
            return false;
        }
        false
    }

    fn compute_output(&mut self, now: Timestamp) -> Option<CoverOutput> {
        let manual = self.pending_manual.take();
        let decision = engine::evaluate(&self.settings, &mut self.state, manual, now)?;
        Some(self.realize(decision))
    }

    fn public_state(&self) -> Value {
        serde_json::json!({
            "state": self.state.state,
            "position": self.state.position,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::control::{ControlRef, ControlType};
    use crate::cover::settings::{
        CloseBySun, CoverSettings, Direction, IlluminationSettings, LevelDetection,
        ManualStrategy, MotionSettings, NoiseSettings, PositionControl, Schedule, StateControl,
        Switcher, SwitchingBoundary, TemperatureSettings, TriggerEdge,
    };

    fn reference(device: &str, control: &str, control_type: ControlType) -> ControlRef {
        ControlRef {
            device_id: device.to_string(),
            control_id: control.to_string(),
            control_type,
        }
    }

    /// A living-room curtain: one wall button, one combined sensor, a relay
    /// curtain motor with enum state and a 0–100 position control.
    pub(crate) fn settings_fixture() -> CoverSettings {
        CoverSettings {
            switchers: vec![Switcher {
                control: reference("wall-btn", "k1", ControlType::Switch),
                trigger: TriggerEdge::Down,
            }],
            manual_block_min: 15,
            manual_strategy: ManualStrategy::Toggle,
            illuminations: vec![reference("wb-ms-1", "lux", ControlType::Illumination)],
            motions: vec![reference("wb-ms-1", "motion", ControlType::Value)],
            noises: vec![reference("wb-ms-1", "noise", ControlType::SoundLevel)],
            temperatures: vec![reference("wb-ms-1", "temp", ControlType::Temperature)],
            state: StateControl {
                control: reference("curtain-1", "state", ControlType::Enum),
                open: "OPEN".to_string(),
                close: "CLOSE".to_string(),
                stop: "STOP".to_string(),
            },
            position: PositionControl {
                control: reference("curtain-1", "position", ControlType::Value),
                open: 100.0,
                close: 0.0,
            },
            illumination: IlluminationSettings {
                detection: LevelDetection::Max,
                switching_boundaries: vec![SwitchingBoundary {
                    close: 25.0,
                    open: 150.0,
                }],
            },
            motion: MotionSettings {
                detection: LevelDetection::Max,
                trigger: 10.0,
            },
            noise: NoiseSettings {
                detection: LevelDetection::Max,
                trigger: 35.0,
            },
            temperature: TemperatureSettings {
                detection: LevelDetection::Max,
            },
            silence_min: 60,
            open_close_by_time: vec![Schedule {
                direction: Direction::Close,
                block_min: 480,
                mins: vec![0, 1080, 1200],
            }],
            close_by_sun: CloseBySun {
                illumination: 3000.0,
                temperature: 28.0,
                position: 40.0,
            },
            blocks: Vec::new(),
        }
    }
}
