//! Shared fakes for the crate's unit tests: an in-memory store, a spy
//! adapter, and a minimal threshold macro exercising the lifecycle without
//! dragging in the full cover settings shape.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use macrohub_domain::control::{
    Command, ControlPayload, ControlRef, ControlType, ControlValue, SwitchState,
};
use macrohub_domain::error::{DispatchFailure, MacroHubError};
use macrohub_domain::id::MacroId;
use macrohub_domain::macros::{MacroLogic, MacroOutput, MacroRecord, VersionedPayload};
use macrohub_domain::showcase::MacroKind;
use macrohub_domain::time::{now, Timestamp};

use crate::ports::{DeviceAdapter, MacroStore};

// ── In-memory macro store ──────────────────────────────────────────

#[derive(Default)]
pub(crate) struct InMemoryMacroStore {
    records: Mutex<HashMap<MacroId, MacroRecord>>,
    states: Mutex<HashMap<MacroId, VersionedPayload>>,
}

impl InMemoryMacroStore {
    pub(crate) fn saved_state(&self, id: MacroId) -> Option<VersionedPayload> {
        self.states.lock().unwrap().get(&id).cloned()
    }
}

impl MacroStore for InMemoryMacroStore {
    fn create(
        &self,
        record: MacroRecord,
    ) -> impl Future<Output = Result<MacroRecord, MacroHubError>> + Send {
        let mut records = self.records.lock().unwrap();
        records.insert(record.info.id, record.clone());
        async { Ok(record) }
    }

    fn get(
        &self,
        id: MacroId,
    ) -> impl Future<Output = Result<Option<MacroRecord>, MacroHubError>> + Send {
        let records = self.records.lock().unwrap();
        let states = self.states.lock().unwrap();
        let mut record = records.get(&id).cloned();
        if let Some(record) = record.as_mut() {
            if let Some(state) = states.get(&id) {
                record.state = Some(state.clone());
            }
        }
        async { Ok(record) }
    }

    fn list(&self) -> impl Future<Output = Result<Vec<MacroRecord>, MacroHubError>> + Send {
        let records = self.records.lock().unwrap();
        let states = self.states.lock().unwrap();
        let all: Vec<MacroRecord> = records
            .values()
            .cloned()
            .map(|mut record| {
                if let Some(state) = states.get(&record.info.id) {
                    record.state = Some(state.clone());
                }
                record
            })
            .collect();
        async { Ok(all) }
    }

    fn save_state(
        &self,
        id: MacroId,
        state: VersionedPayload,
    ) -> impl Future<Output = Result<(), MacroHubError>> + Send {
        self.states.lock().unwrap().insert(id, state);
        async { Ok(()) }
    }

    fn delete(&self, id: MacroId) -> impl Future<Output = Result<(), MacroHubError>> + Send {
        self.records.lock().unwrap().remove(&id);
        self.states.lock().unwrap().remove(&id);
        async { Ok(()) }
    }
}

// ── Spy device adapter ─────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct SpyAdapter {
    commands: Mutex<Vec<Command>>,
}

impl SpyAdapter {
    pub(crate) fn sent(&self) -> Vec<Command> {
        self.commands.lock().unwrap().clone()
    }
}

impl DeviceAdapter for SpyAdapter {
    fn dispatch(
        &self,
        command: Command,
    ) -> impl Future<Output = Result<(), DispatchFailure>> + Send {
        self.commands.lock().unwrap().push(command);
        async { Ok(()) }
    }
}

// ── Threshold macro ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ThresholdSettings {
    pub(crate) sensor: ControlRef,
    pub(crate) relay: ControlRef,
    pub(crate) threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ThresholdState {
    pub(crate) level: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ThresholdOutput {
    command: Command,
}

impl MacroOutput for ThresholdOutput {
    fn commands(&self) -> Vec<Command> {
        vec![self.command.clone()]
    }
}

/// Switches a relay on above a sensor threshold, off below.
pub(crate) struct ThresholdMacro {
    settings: ThresholdSettings,
    state: ThresholdState,
}

impl MacroLogic for ThresholdMacro {
    type Settings = ThresholdSettings;
    type State = ThresholdState;
    type Output = ThresholdOutput;

    const KIND: MacroKind = MacroKind::Lighting;
    const VERSION: u32 = 1;

    fn parse_settings(raw: &str, _from_version: u32) -> Result<ThresholdSettings, MacroHubError> {
        serde_json::from_str(raw).map_err(|err| {
            macrohub_domain::error::MalformedSettings::Decode(err).into()
        })
    }

    fn parse_state(raw: Option<&str>) -> ThresholdState {
        raw.and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or(ThresholdState { level: -1.0 })
    }

    fn new(settings: ThresholdSettings, state: ThresholdState) -> Self {
        Self { settings, state }
    }

    fn state(&self) -> &ThresholdState {
        &self.state
    }

    fn subscriptions(&self) -> Vec<ControlRef> {
        vec![self.settings.sensor.clone()]
    }

    fn apply_public_state(&mut self, update: &serde_json::Value, _now: Timestamp) -> bool {
        match update.get("level").and_then(serde_json::Value::as_f64) {
            Some(level) => {
                self.state.level = level;
                true
            }
            None => false,
        }
    }

    fn apply_external_value(&mut self, value: &ControlValue) -> bool {
        let Some(level) = value.payload.as_analog() else {
            return false;
        };
        let changed = (self.state.level - level).abs() > f64::EPSILON;
        self.state.level = level;
        changed
    }

    fn compute_output(&mut self, _now: Timestamp) -> Option<ThresholdOutput> {
        if self.state.level < 0.0 {
            return None;
        }
        let target = if self.state.level > self.settings.threshold {
            SwitchState::On
        } else {
            SwitchState::Off
        };
        Some(ThresholdOutput {
            command: Command {
                device_id: self.settings.relay.device_id.clone(),
                control_id: self.settings.relay.control_id.clone(),
                control_type: self.settings.relay.control_type,
                payload: ControlPayload::Switch(target),
            },
        })
    }

    fn public_state(&self) -> serde_json::Value {
        serde_json::json!({"level": self.state.level})
    }
}

pub(crate) fn threshold_settings() -> ThresholdSettings {
    ThresholdSettings {
        sensor: ControlRef {
            device_id: "wb-ms-1".to_string(),
            control_id: "lux".to_string(),
            control_type: ControlType::Illumination,
        },
        relay: ControlRef {
            device_id: "wb-mr6c".to_string(),
            control_id: "k1".to_string(),
            control_type: ControlType::Switch,
        },
        threshold: 50.0,
    }
}

pub(crate) fn threshold_macro() -> ThresholdMacro {
    ThresholdMacro::new(threshold_settings(), ThresholdMacro::parse_state(None))
}

pub(crate) fn threshold_value(level: f64) -> ControlValue {
    ControlValue::new(
        &threshold_settings().sensor,
        ControlPayload::Analog(level),
        now(),
    )
}

/// The relay reporting its own switch level, as a device would after moving.
pub(crate) fn relay_feedback(level: SwitchState) -> ControlValue {
    ControlValue::new(
        &threshold_settings().relay,
        ControlPayload::Switch(level),
        now(),
    )
}
