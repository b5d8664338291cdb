//! The cover rule engine: a strict priority chain over settings and state.
//!
//! Evaluation is total — every rule either produces a decision or falls
//! through, and the first decision wins the cycle. The engine compares
//! against a supplied current time and never reads the clock or touches IO.
//!
//! Chain, highest first:
//! 1. manual override (switcher press or explicit user command), which
//!    starts the manual lockout;
//! 2. the lockout itself, suppressing everything below while active;
//! 3. time-of-day schedules (close wins a same-minute collision, no command
//!    and no lockout when already at the target state);
//! 4. blocking windows, suppressing the automatic rules below;
//! 5. illumination hysteresis with close-wins across bands;
//! 6. occupancy gating of opens plus the silence-driven close;
//! 7. sun-based partial close.

use chrono::Duration;

use crate::cover::settings::{CoverSettings, Direction, ManualStrategy, Schedule};
use crate::cover::state::{known, CoverState};
use crate::time::{hour_in_range, hour_of_day, minute_of_day, Timestamp};

/// Categorical movement command, before mapping onto device enum strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverCommand {
    Open,
    Close,
    Stop,
}

/// One decision produced by the chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// Full movement or stop via the state control.
    State(CoverCommand),
    /// Move to a normalized position in `0..=100` via the position control.
    Position(f64),
}

/// A manual input consumed by the next evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ManualIntent {
    /// A switcher fired; the configured strategy picks the command.
    Press,
    /// An explicit user command from the management surface.
    Explicit(Decision),
}

/// Run the chain once. Updates lockout and last-direction bookkeeping on
/// `state`; the caller applies the returned decision to the public
/// projection and dispatches it.
pub fn evaluate(
    settings: &CoverSettings,
    state: &mut CoverState,
    manual: Option<ManualIntent>,
    now: Timestamp,
) -> Option<Decision> {
    if let Some(intent) = manual {
        let decision = resolve_manual(settings, state, intent);
        state.lockout_until = Some(now + Duration::minutes(i64::from(settings.manual_block_min)));
        record_direction(state, decision);
        return Some(decision);
    }

    if state
        .lockout_until
        .is_some_and(|until| now < until)
    {
        return None;
    }

    if let Some(decision) = schedule_decision(settings, state, now) {
        record_direction(state, decision);
        return Some(decision);
    }

    let decision = automatic_decision(settings, state, now)?;
    let direction = match decision {
        Decision::State(CoverCommand::Open) => Direction::Open,
        Decision::State(CoverCommand::Close | CoverCommand::Stop) | Decision::Position(_) => {
            Direction::Close
        }
    };
    if blocked(settings, direction, now) {
        return None;
    }
    record_direction(state, decision);
    Some(decision)
}

fn resolve_manual(settings: &CoverSettings, state: &CoverState, intent: ManualIntent) -> Decision {
    match intent {
        ManualIntent::Explicit(decision) => decision,
        ManualIntent::Press => match settings.manual_strategy {
            ManualStrategy::Toggle => {
                if state.state == settings.state.open {
                    Decision::State(CoverCommand::Close)
                } else {
                    Decision::State(CoverCommand::Open)
                }
            }
            ManualStrategy::Cycle => {
                let moving =
                    state.state == settings.state.open || state.state == settings.state.close;
                if moving {
                    Decision::State(CoverCommand::Stop)
                } else {
                    match state.last_direction {
                        Some(Direction::Open) => Decision::State(CoverCommand::Close),
                        Some(Direction::Close) | None => Decision::State(CoverCommand::Open),
                    }
                }
            }
        },
    }
}

fn record_direction(state: &mut CoverState, decision: Decision) {
    state.last_direction = match decision {
        Decision::State(CoverCommand::Open) => Some(Direction::Open),
        Decision::State(CoverCommand::Close) => Some(Direction::Close),
        Decision::State(CoverCommand::Stop) => state.last_direction,
        Decision::Position(target) => {
            if target < state.position {
                Some(Direction::Close)
            } else if target > state.position {
                Some(Direction::Open)
            } else {
                state.last_direction
            }
        }
    };
}

/// Rule 2. Close wins when two entries collide on the same minute; a cover
/// already at the target state gets neither a command nor a lockout.
fn schedule_decision(
    settings: &CoverSettings,
    state: &mut CoverState,
    now: Timestamp,
) -> Option<Decision> {
    let minute = minute_of_day(now);
    let mut matched: Option<&Schedule> = None;
    for entry in &settings.open_close_by_time {
        if !entry.mins.contains(&minute) {
            continue;
        }
        matched = match matched {
            Some(previous) if previous.direction == Direction::Close => Some(previous),
            _ => Some(entry),
        };
    }
    let entry = matched?;

    let (command, target) = match entry.direction {
        Direction::Open => (CoverCommand::Open, &settings.state.open),
        Direction::Close => (CoverCommand::Close, &settings.state.close),
    };
    if state.state == *target {
        return None;
    }
    state.lockout_until = Some(now + Duration::minutes(i64::from(entry.block_min)));
    Some(Decision::State(command))
}

/// Rule 3: whether any configured window suppresses a movement in
/// `direction` right now.
fn blocked(settings: &CoverSettings, direction: Direction, now: Timestamp) -> bool {
    let hour = hour_of_day(now);
    settings.blocks.iter().any(|window| {
        window.block_type.covers(direction) && hour_in_range(hour, window.from_hour, window.to_hour)
    })
}

/// Rules 4–6. All comparisons are strict except the sun thresholds, so a
/// reading exactly at a boundary never flips state on its own.
fn automatic_decision(
    settings: &CoverSettings,
    state: &CoverState,
    now: Timestamp,
) -> Option<Decision> {
    let illumination = state.illumination;
    let occupied = occupancy(settings, state);

    let mut close_signal = false;
    let mut open_signal = false;
    if known(illumination) {
        for band in &settings.illumination.switching_boundaries {
            if band.close < band.open {
                if illumination < band.close {
                    close_signal = true;
                } else if illumination > band.open {
                    open_signal = true;
                } else if occupied && illumination > band.close {
                    // Light has recovered above the close threshold and
                    // somebody is around: enough to open without waiting
                    // for the full open threshold.
                    open_signal = true;
                }
            } else if band.close > band.open {
                if illumination > band.close {
                    close_signal = true;
                } else if illumination < band.open {
                    open_signal = true;
                }
            }
        }
    }

    if close_signal {
        return Some(Decision::State(CoverCommand::Close));
    }
    if open_signal {
        // Never open on light alone.
        if occupied {
            return Some(Decision::State(CoverCommand::Open));
        }
    } else if silence_held(settings, state, now)
        && known(illumination)
        && settings
            .illumination
            .switching_boundaries
            .iter()
            .any(|band| illumination > band.close)
    {
        // Quiet long enough with the light still above the close threshold:
        // close without a hysteresis signal.
        return Some(Decision::State(CoverCommand::Close));
    }

    sun_decision(settings, state, now)
}

/// Rule 6: partial close on high solar activity. Only ever closes, and only
/// when the cover sits above the target position.
fn sun_decision(
    settings: &CoverSettings,
    state: &CoverState,
    now: Timestamp,
) -> Option<Decision> {
    let sun = &settings.close_by_sun;
    if !silence_held(settings, state, now) {
        return None;
    }
    if !known(state.illumination) || !known(state.temperature) {
        return None;
    }
    if state.illumination >= sun.illumination
        && state.temperature >= sun.temperature
        && state.position > sun.position
    {
        return Some(Decision::Position(sun.position));
    }
    None
}

/// Aggregated motion or noise strictly above its trigger sensitivity.
fn occupancy(settings: &CoverSettings, state: &CoverState) -> bool {
    state.motion > settings.motion.trigger || state.noise > settings.noise.trigger
}

/// The silence factor: quiet sustained for at least `silence_min` minutes.
/// Disabled entirely when `silence_min` is zero.
fn silence_held(settings: &CoverSettings, state: &CoverState, now: Timestamp) -> bool {
    if settings.silence_min == 0 {
        return false;
    }
    state
        .calm_since
        .is_some_and(|since| now - since >= Duration::minutes(i64::from(settings.silence_min)))
}
