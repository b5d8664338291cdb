//! Storage port — persistence for macro records and state snapshots.

use std::future::Future;

use macrohub_domain::error::MacroHubError;
use macrohub_domain::id::MacroId;
use macrohub_domain::macros::{MacroRecord, VersionedPayload};

/// Repository for macro instances.
///
/// Settings are written only through `create`; state snapshots are written
/// after every accepted change through `save_state`.
pub trait MacroStore: Send + Sync {
    /// Persist a new macro record.
    fn create(
        &self,
        record: MacroRecord,
    ) -> impl Future<Output = Result<MacroRecord, MacroHubError>> + Send;

    /// Fetch one record by id.
    fn get(
        &self,
        id: MacroId,
    ) -> impl Future<Output = Result<Option<MacroRecord>, MacroHubError>> + Send;

    /// Fetch every stored record.
    fn list(&self) -> impl Future<Output = Result<Vec<MacroRecord>, MacroHubError>> + Send;

    /// Replace the state snapshot of an existing record.
    fn save_state(
        &self,
        id: MacroId,
        state: VersionedPayload,
    ) -> impl Future<Output = Result<(), MacroHubError>> + Send;

    /// Remove a record. Removing an absent record is not an error.
    fn delete(&self, id: MacroId) -> impl Future<Output = Result<(), MacroHubError>> + Send;
}

impl<T: MacroStore> MacroStore for std::sync::Arc<T> {
    fn create(
        &self,
        record: MacroRecord,
    ) -> impl Future<Output = Result<MacroRecord, MacroHubError>> + Send {
        T::create(self, record)
    }

    fn get(
        &self,
        id: MacroId,
    ) -> impl Future<Output = Result<Option<MacroRecord>, MacroHubError>> + Send {
        T::get(self, id)
    }

    fn list(&self) -> impl Future<Output = Result<Vec<MacroRecord>, MacroHubError>> + Send {
        T::list(self)
    }

    fn save_state(
        &self,
        id: MacroId,
        state: VersionedPayload,
    ) -> impl Future<Output = Result<(), MacroHubError>> + Send {
        T::save_state(self, id, state)
    }

    fn delete(&self, id: MacroId) -> impl Future<Output = Result<(), MacroHubError>> + Send {
        T::delete(self, id)
    }
}
