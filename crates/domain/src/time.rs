//! Time and timestamp helpers.
//!
//! Clock-driven rules (schedules, blocking windows, lockouts, silence
//! tracking) never read the wall clock themselves — they compare against a
//! supplied "current time", so the whole rule engine stays synchronous and
//! testable without real time passing.

use chrono::{DateTime, Timelike, Utc};

/// UTC timestamp used for control values, lockouts, event times, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Minute of day in `0..1440` for the given timestamp.
#[must_use]
pub fn minute_of_day(ts: Timestamp) -> u32 {
    ts.hour() * 60 + ts.minute()
}

/// Hour of day in `0..24` for the given timestamp.
#[must_use]
pub fn hour_of_day(ts: Timestamp) -> u32 {
    ts.hour()
}

/// Whether `hour` falls inside the range `[from, to)`.
///
/// A range with `from > to` crosses midnight (e.g. `23..6` covers
/// 23:00–24:00 and 00:00–06:00). `from == to` matches nothing.
#[must_use]
pub fn hour_in_range(hour: u32, from: u32, to: u32) -> bool {
    if from <= to {
        hour >= from && hour < to
    } else {
        hour >= from || hour < to
    }
}
