//! Macro lifecycle contract — the generic behavior every automation type
//! shares.
//!
//! A macro is one configured automation instance bound to specific device
//! controls. The hub owns instances: it parses persisted settings and state,
//! routes inbound control values, asks for the next output, and dispatches
//! it. Macro types form a closed set ([`MacroKind`]) and plug in through
//! [`MacroLogic`] rather than open-ended subclassing.
//!
//! Invocation order per cycle is fixed: `apply_input` (or
//! `apply_public_state`) → `compute_output` → output dispatch. The runner in
//! the `app` crate guarantees no two cycles of one instance interleave.

use serde::{Deserialize, Serialize};

use crate::control::{Command, ControlRef, ControlValue};
use crate::error::MacroHubError;
use crate::id::MacroId;
use crate::showcase::MacroKind;
use crate::time::Timestamp;

/// Version-tagged serialized text, the external representation of both
/// settings and state snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedPayload {
    pub version: u32,
    pub payload: String,
}

/// User-facing metadata for one macro instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacroInfo {
    pub id: MacroId,
    pub kind: MacroKind,
    pub name: String,
    pub description: String,
    pub labels: Vec<String>,
}

/// One persisted macro: metadata, versioned settings, and the latest state
/// snapshot when one has been taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacroRecord {
    pub info: MacroInfo,
    pub settings: VersionedPayload,
    pub state: Option<VersionedPayload>,
}

/// The transient result of one evaluation cycle.
///
/// Equality is what the dispatcher compares across cycles: identical
/// consecutive outputs must not resend commands.
pub trait MacroOutput: Clone + PartialEq + Send {
    /// Device commands realizing this output, in dispatch order.
    fn commands(&self) -> Vec<Command>;
}

/// Type-specific behavior of one macro kind.
///
/// All methods are synchronous and IO-free; side effects (event bus,
/// device adapter, persistence) live behind ports in the `app` crate.
pub trait MacroLogic: Send + Sized + 'static {
    /// Immutable per-instance configuration, replaced wholesale on update.
    type Settings: Send + Sync;
    /// Persisted snapshot state, mutated on every accepted input.
    type State: Serialize + Send;
    /// Computed output shape.
    type Output: MacroOutput;

    const KIND: MacroKind;
    /// Current settings/state schema version.
    const VERSION: u32;

    /// Decode settings stored at `from_version`, migrating to
    /// [`VERSION`](Self::VERSION) when older.
    ///
    /// # Errors
    ///
    /// Returns [`MacroHubError::MalformedSettings`] when decoding or any
    /// migration step fails. Fatal to construction.
    fn parse_settings(raw: &str, from_version: u32) -> Result<Self::Settings, MacroHubError>;

    /// Decode a persisted state snapshot, or return the documented default
    /// when absent. Never fails: a malformed payload is logged and replaced
    /// by the default.
    fn parse_state(raw: Option<&str>) -> Self::State;

    /// Assemble an instance from parsed parts.
    fn new(settings: Self::Settings, state: Self::State) -> Self;

    /// Borrow the current state for snapshotting.
    fn state(&self) -> &Self::State;

    /// The union of control references this instance observes.
    fn subscriptions(&self) -> Vec<ControlRef>;

    /// Fold a user-initiated public-state change in. Returns whether it was
    /// accepted; acceptance criteria are macro-type-specific.
    fn apply_public_state(&mut self, update: &serde_json::Value, now: Timestamp) -> bool;

    /// Route one inbound control value. Unrecognized controls are silently
    /// ignored. Returns whether state changed.
    fn apply_input(&mut self, value: &ControlValue) -> bool {
        if self.subscriptions().iter().any(|r| r.matches(value)) {
            self.apply_external_value(value)
        } else {
            false
        }
    }

    /// Fold one recognized reading into private state. Returns whether
    /// state changed.
    fn apply_external_value(&mut self, value: &ControlValue) -> bool;

    /// Compute the next desired output from current settings and state.
    ///
    /// Total over its inputs: there is no error path. May update internal
    /// bookkeeping (lockouts, consumed triggers) but must not touch
    /// external resources.
    fn compute_output(&mut self, now: Timestamp) -> Option<Self::Output>;

    /// Public projection of the state, for the management surface.
    fn public_state(&self) -> serde_json::Value;

    /// Serialize the current state as a version-tagged snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`MacroHubError::Storage`] if serialization fails.
    fn state_snapshot(&self) -> Result<VersionedPayload, MacroHubError> {
        let payload = serde_json::to_string(self.state())
            .map_err(|err| MacroHubError::Storage(Box::new(err)))?;
        Ok(VersionedPayload {
            version: Self::VERSION,
            payload,
        })
    }
}
