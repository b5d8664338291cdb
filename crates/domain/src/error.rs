//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`MacroHubError`] via `#[from]` at the port boundaries. The rule engine
//! itself has no error path: every rule either produces a decision or falls
//! through.

use crate::control::ControlType;

/// Top-level error for the macrohub workspace.
#[derive(Debug, thiserror::Error)]
pub enum MacroHubError {
    /// Settings payload failed to decode or migrate. Fatal to macro
    /// construction: the macro does not start.
    #[error("malformed settings")]
    MalformedSettings(#[from] MalformedSettings),

    /// Persisted state failed to decode. Recovered locally by falling back
    /// to the default state; surfaced here only for logging.
    #[error("malformed state")]
    MalformedState(#[from] MalformedState),

    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The device adapter rejected or timed out on a command. Not retried
    /// by the rule engine; the next cycle re-evaluates.
    #[error("dispatch failure")]
    Dispatch(#[from] DispatchFailure),

    /// A referenced record does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// The macro kind appears in the catalog but has no engine yet.
    #[error("macro kind {0} is not implemented")]
    UnsupportedKind(crate::showcase::MacroKind),

    /// A storage adapter failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Settings decode/migration failures.
#[derive(Debug, thiserror::Error)]
pub enum MalformedSettings {
    /// The payload is not valid JSON for the expected shape.
    #[error("failed to decode settings payload")]
    Decode(#[source] serde_json::Error),

    /// The stored version cannot be migrated to the current one.
    #[error("no migration path from version {from} to {to}")]
    NoMigrationPath { from: u32, to: u32 },

    /// One migration step in the chain failed.
    #[error("migration step for version {version} failed: {reason}")]
    Migration { version: u32, reason: String },
}

/// Persisted state decode failure.
#[derive(Debug, thiserror::Error)]
pub enum MalformedState {
    /// The payload is not valid JSON for the expected shape.
    #[error("failed to decode state payload")]
    Decode(#[source] serde_json::Error),
}

/// Domain invariant violations.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// A control reference is listed under a category whose control type it
    /// does not carry.
    #[error("{category} control {control_id} has type {found:?}, expected {expected:?}")]
    ControlTypeMismatch {
        category: &'static str,
        control_id: String,
        expected: ControlType,
        found: ControlType,
    },

    /// A schedule entry references a minute outside `0..1440`.
    #[error("schedule minute {minute} is out of range")]
    MinuteOutOfRange { minute: u32 },

    /// A blocking window references an hour outside `0..24`.
    #[error("block window hour {hour} is out of range")]
    HourOutOfRange { hour: u32 },

    /// A position value falls outside `0..=100`.
    #[error("position {position} is out of range")]
    PositionOutOfRange { position: f64 },
}

/// A device command was rejected by the adapter.
#[derive(Debug, thiserror::Error)]
#[error("command for {device_id}/{control_id} failed: {reason}")]
pub struct DispatchFailure {
    pub device_id: String,
    pub control_id: String,
    pub reason: String,
}

/// A record lookup came back empty.
#[derive(Debug, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}
