//! Cover macro settings — immutable per instance, replaced wholesale.
//!
//! A cover is driven by buttons and contacts (switchers), illumination,
//! motion, noise, temperature, time-of-day schedules, and blocking windows.
//! Every control reference here points at an externally-owned endpoint; the
//! type of each reference must match the category it is listed under.

use serde::{Deserialize, Serialize};

use crate::control::{ControlRef, ControlType, SwitchState};
use crate::error::ValidationError;

/// Which switch level fires the manual reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TriggerEdge {
    /// React on the high level (`ON`).
    Up,
    /// React on the low level (`OFF`). The usual wiring for buttons.
    #[default]
    Down,
}

impl TriggerEdge {
    /// The switch level that fires this trigger.
    #[must_use]
    pub fn firing_level(self) -> SwitchState {
        match self {
            Self::Up => SwitchState::On,
            Self::Down => SwitchState::Off,
        }
    }
}

/// Reduction rule combining several same-category sensors into one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LevelDetection {
    #[default]
    Max,
    Min,
    Avg,
}

/// Direction of a movement command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Open,
    Close,
}

/// Which automatic action a blocking window suppresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BlockType {
    Open,
    Close,
    All,
}

impl BlockType {
    /// Whether this window type suppresses a movement in `direction`.
    #[must_use]
    pub fn covers(self, direction: Direction) -> bool {
        match self {
            Self::All => true,
            Self::Open => direction == Direction::Open,
            Self::Close => direction == Direction::Close,
        }
    }
}

/// How repeated manual presses translate into commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ManualStrategy {
    /// Alternate between open and close by current state.
    #[default]
    Toggle,
    /// Classic curtain button: a press while moving stops, a press while
    /// stopped moves opposite to the last direction.
    Cycle,
}

/// A manual switch input: button, virtual button, or reed contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Switcher {
    #[serde(flatten)]
    pub control: ControlRef,
    #[serde(default)]
    pub trigger: TriggerEdge,
}

/// The cover's categorical state control and the user-chosen mapping onto
/// the device's own enum strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateControl {
    #[serde(flatten)]
    pub control: ControlRef,
    pub open: String,
    pub close: String,
    pub stop: String,
}

/// The cover's position control and the device values of its endpoints.
///
/// `open > close` means the device counts inverted; the dispatcher maps
/// through this range either way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionControl {
    #[serde(flatten)]
    pub control: ControlRef,
    pub open: f64,
    pub close: f64,
}

/// One illumination hysteresis band, `(close, open)` thresholds.
///
/// `close < open` is the normal band: close below `close`, open above
/// `open`. `close > open` is the inverted band (excess sun): close above
/// `close`, open below `open`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwitchingBoundary {
    pub close: f64,
    pub open: f64,
}

/// Illumination category settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IlluminationSettings {
    #[serde(default)]
    pub detection: LevelDetection,
    #[serde(default)]
    pub switching_boundaries: Vec<SwitchingBoundary>,
}

/// Motion category settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionSettings {
    #[serde(default)]
    pub detection: LevelDetection,
    /// Sensitivity: aggregated motion strictly above this counts as
    /// occupancy.
    pub trigger: f64,
}

/// Noise category settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseSettings {
    #[serde(default)]
    pub detection: LevelDetection,
    /// Sensitivity: aggregated noise strictly above this counts as
    /// occupancy.
    pub trigger: f64,
}

/// Temperature category settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TemperatureSettings {
    #[serde(default)]
    pub detection: LevelDetection,
}

/// One time-of-day schedule: try to move in `direction` at each minute in
/// `mins`, then block automatic actions for `block_min` minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub direction: Direction,
    pub block_min: u32,
    pub mins: Vec<u32>,
}

/// Partial close on high solar activity: illumination and temperature at or
/// above these thresholds, with the silence factor held, move the cover to
/// `position` instead of fully closing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloseBySun {
    pub illumination: f64,
    pub temperature: f64,
    pub position: f64,
}

/// A blocking window over an hour range; `from_hour > to_hour` crosses
/// midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockWindow {
    pub block_type: BlockType,
    pub from_hour: u32,
    pub to_hour: u32,
}

fn default_manual_block_min() -> u32 {
    15
}

/// Full settings for one cover macro instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverSettings {
    #[serde(default)]
    pub switchers: Vec<Switcher>,
    /// Manual lockout: minutes during which automatic rules stay suppressed
    /// after a manual command.
    #[serde(default = "default_manual_block_min")]
    pub manual_block_min: u32,
    #[serde(default)]
    pub manual_strategy: ManualStrategy,

    #[serde(default)]
    pub illuminations: Vec<ControlRef>,
    #[serde(default)]
    pub motions: Vec<ControlRef>,
    #[serde(default)]
    pub noises: Vec<ControlRef>,
    #[serde(default)]
    pub temperatures: Vec<ControlRef>,

    pub state: StateControl,
    pub position: PositionControl,

    pub illumination: IlluminationSettings,
    pub motion: MotionSettings,
    pub noise: NoiseSettings,
    #[serde(default)]
    pub temperature: TemperatureSettings,

    /// Minutes of sustained quiet (no motion, no noise) that constitute the
    /// silence factor. Zero disables it.
    #[serde(default)]
    pub silence_min: u32,

    #[serde(default)]
    pub open_close_by_time: Vec<Schedule>,
    pub close_by_sun: CloseBySun,
    #[serde(default)]
    pub blocks: Vec<BlockWindow>,
}

impl CoverSettings {
    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when a control reference's type does not
    /// match its category, or when a schedule minute, block hour, or
    /// position falls out of range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for switcher in &self.switchers {
            check_type("switchers", &switcher.control, ControlType::Switch)?;
        }
        for reference in &self.illuminations {
            check_type("illuminations", reference, ControlType::Illumination)?;
        }
        for reference in &self.motions {
            check_type("motions", reference, ControlType::Value)?;
        }
        for reference in &self.noises {
            check_type("noises", reference, ControlType::SoundLevel)?;
        }
        for reference in &self.temperatures {
            check_type("temperatures", reference, ControlType::Temperature)?;
        }
        check_type("state", &self.state.control, ControlType::Enum)?;
        check_type("position", &self.position.control, ControlType::Value)?;

        for schedule in &self.open_close_by_time {
            if let Some(&minute) = schedule.mins.iter().find(|&&minute| minute >= 24 * 60) {
                return Err(ValidationError::MinuteOutOfRange { minute });
            }
        }
        for window in &self.blocks {
            for hour in [window.from_hour, window.to_hour] {
                if hour > 24 {
                    return Err(ValidationError::HourOutOfRange { hour });
                }
            }
        }
        if !(0.0..=100.0).contains(&self.close_by_sun.position) {
            return Err(ValidationError::PositionOutOfRange {
                position: self.close_by_sun.position,
            });
        }
        Ok(())
    }

    /// The union of control references this macro observes: all sensor and
    /// switcher inputs plus the state/position feedback controls.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<ControlRef> {
        let mut refs: Vec<ControlRef> = Vec::new();
        refs.extend(self.switchers.iter().map(|s| s.control.clone()));
        refs.extend(self.illuminations.iter().cloned());
        refs.extend(self.motions.iter().cloned());
        refs.extend(self.noises.iter().cloned());
        refs.extend(self.temperatures.iter().cloned());
        refs.push(self.state.control.clone());
        refs.push(self.position.control.clone());
        refs
    }
}

fn check_type(
    category: &'static str,
    reference: &ControlRef,
    expected: ControlType,
) -> Result<(), ValidationError> {
    if reference.control_type == expected {
        Ok(())
    } else {
        Err(ValidationError::ControlTypeMismatch {
            category,
            control_id: reference.control_id.clone(),
            expected,
            found: reference.control_type,
        })
    }
}
