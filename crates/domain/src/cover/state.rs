//! Persisted cover state: the public projection plus engine bookkeeping.
//!
//! One flat snapshot; the public surface exposes only `state` and
//! `position`, the rest survives restarts so lockouts and silence tracking
//! pick up where they left off.

use serde::{Deserialize, Serialize};

use crate::control::SwitchState;
use crate::cover::settings::Direction;
use crate::time::Timestamp;

/// Sentinel for a sensor aggregate no reading has arrived for yet.
pub const UNKNOWN_LEVEL: f64 = -1.0;

/// Whether an aggregate carries a real reading rather than the sentinel.
#[must_use]
pub fn known(level: f64) -> bool {
    level > UNKNOWN_LEVEL
}

/// Snapshot state of one cover instance.
///
/// `state` holds the device-mapped enum string last commanded or reported;
/// `position` is normalized to `0..=100` with 100 fully open. Sensor
/// aggregates start at [`UNKNOWN_LEVEL`] until the first reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverState {
    pub state: String,
    pub position: f64,
    pub switch: SwitchState,
    pub illumination: f64,
    pub motion: f64,
    pub noise: f64,
    pub temperature: f64,
    /// Automatic rules stay suppressed until this instant.
    #[serde(default)]
    pub lockout_until: Option<Timestamp>,
    /// Start of the current uninterrupted quiet stretch.
    #[serde(default)]
    pub calm_since: Option<Timestamp>,
    /// Direction of the last movement command, for the cycle strategy.
    #[serde(default)]
    pub last_direction: Option<Direction>,
}

impl Default for CoverState {
    fn default() -> Self {
        Self {
            state: "STOP".to_string(),
            position: 100.0,
            switch: SwitchState::Off,
            illumination: UNKNOWN_LEVEL,
            motion: UNKNOWN_LEVEL,
            noise: UNKNOWN_LEVEL,
            temperature: UNKNOWN_LEVEL,
            lockout_until: None,
            calm_since: None,
            last_direction: None,
        }
    }
}
