//! Controls — externally-owned device endpoints and the values they carry.
//!
//! A control belongs to the external device registry; macros hold
//! [`ControlRef`]s, never ownership. Values arriving from the device adapter
//! are [`ControlValue`]s; commands going back are [`Command`]s.

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// Semantic shape of the values on a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlType {
    Switch,
    Illumination,
    Value,
    SoundLevel,
    Temperature,
    Enum,
}

/// Reference to one `(device, control)` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlRef {
    pub device_id: String,
    pub control_id: String,
    pub control_type: ControlType,
}

impl ControlRef {
    /// Whether an inbound value addresses this control.
    ///
    /// Keyed on `(device_id, control_id)` only; the registry guarantees the
    /// type does not change for a given address.
    #[must_use]
    pub fn matches(&self, value: &ControlValue) -> bool {
        self.device_id == value.device_id && self.control_id == value.control_id
    }
}

/// State of a two-position switch control (relay, button, reed contact).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SwitchState {
    On,
    #[default]
    Off,
}

/// Typed payload carried by a control value or command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlPayload {
    /// Two-position switch level.
    Switch(SwitchState),
    /// Numeric reading or setpoint (lux, dB, °C, position, …).
    Analog(f64),
    /// One value of a device-defined enum.
    Discrete(String),
}

impl ControlPayload {
    /// Numeric view of the payload, if it has one.
    #[must_use]
    pub fn as_analog(&self) -> Option<f64> {
        match self {
            Self::Analog(value) => Some(*value),
            Self::Switch(_) | Self::Discrete(_) => None,
        }
    }

    /// Switch view of the payload, if it has one.
    #[must_use]
    pub fn as_switch(&self) -> Option<SwitchState> {
        match self {
            Self::Switch(state) => Some(*state),
            Self::Analog(_) | Self::Discrete(_) => None,
        }
    }
}

/// A timestamped value for one `(device, control)` pair, as delivered by the
/// device adapter over the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlValue {
    pub device_id: String,
    pub control_id: String,
    pub control_type: ControlType,
    pub payload: ControlPayload,
    pub timestamp: Timestamp,
}

impl ControlValue {
    /// Build a value stamped with the given time.
    #[must_use]
    pub fn new(
        reference: &ControlRef,
        payload: ControlPayload,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            device_id: reference.device_id.clone(),
            control_id: reference.control_id.clone(),
            control_type: reference.control_type,
            payload,
            timestamp,
        }
    }
}

/// A command for one control, handed to the device adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub device_id: String,
    pub control_id: String,
    pub control_type: ControlType,
    pub payload: ControlPayload,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::now;

    fn lux_ref() -> ControlRef {
        ControlRef {
            device_id: "wb-ms-1".to_string(),
            control_id: "lux".to_string(),
            control_type: ControlType::Illumination,
        }
    }

    #[test]
    fn should_match_value_with_same_address() {
        let reference = lux_ref();
        let value = ControlValue::new(&reference, ControlPayload::Analog(120.0), now());
        assert!(reference.matches(&value));
    }

    #[test]
    fn should_not_match_value_with_different_control_id() {
        let reference = lux_ref();
        let mut value = ControlValue::new(&reference, ControlPayload::Analog(120.0), now());
        value.control_id = "temperature".to_string();
        assert!(!reference.matches(&value));
    }

    #[test]
    fn should_expose_analog_payload_as_number() {
        assert_eq!(ControlPayload::Analog(42.5).as_analog(), Some(42.5));
        assert_eq!(ControlPayload::Switch(SwitchState::On).as_analog(), None);
    }

    #[test]
    fn should_expose_switch_payload_as_switch_state() {
        assert_eq!(
            ControlPayload::Switch(SwitchState::On).as_switch(),
            Some(SwitchState::On)
        );
        assert_eq!(ControlPayload::Analog(1.0).as_switch(), None);
    }

    #[test]
    fn should_serialize_control_type_as_screaming_snake_case() {
        let json = serde_json::to_string(&ControlType::SoundLevel).unwrap();
        assert_eq!(json, "\"SOUND_LEVEL\"");
    }

    #[test]
    fn should_roundtrip_control_value_through_serde_json() {
        let value = ControlValue::new(&lux_ref(), ControlPayload::Analog(300.0), now());
        let json = serde_json::to_string(&value).unwrap();
        let parsed: ControlValue = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, value);
    }
}
