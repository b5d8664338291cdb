//! Per-category sensor fusion.
//!
//! Each sensor category keeps the latest reading per `(device, control)`
//! address and reduces them with the category's [`LevelDetection`] rule.
//! Sensors that have not reported yet simply do not participate; a category
//! with no readings at all aggregates to [`UNKNOWN_LEVEL`].

use std::collections::HashMap;

use crate::control::ControlValue;
use crate::cover::settings::LevelDetection;
use crate::cover::state::UNKNOWN_LEVEL;

/// Latest readings for one sensor category.
#[derive(Debug, Default)]
pub struct SensorBank {
    readings: HashMap<(String, String), f64>,
}

impl SensorBank {
    /// Store the analog payload of `value` as the latest reading for its
    /// address. Returns whether the stored reading changed; non-analog
    /// payloads are ignored.
    pub fn record(&mut self, value: &ControlValue) -> bool {
        let Some(level) = value.payload.as_analog() else {
            return false;
        };
        let key = (value.device_id.clone(), value.control_id.clone());
        let previous = self.readings.insert(key, level);
        previous != Some(level)
    }

    /// Reduce the stored readings with `detection`.
    #[must_use]
    pub fn aggregate(&self, detection: LevelDetection) -> f64 {
        if self.readings.is_empty() {
            return UNKNOWN_LEVEL;
        }
        let values = self.readings.values().copied();
        match detection {
            LevelDetection::Max => values.fold(f64::MIN, f64::max),
            LevelDetection::Min => values.fold(f64::MAX, f64::min),
            LevelDetection::Avg => {
                let count = self.readings.len() as f64;
                values.sum::<f64>() / count
            }
        }
    }
}
