//! Hub service — owns the running macro instances.
//!
//! The hub persists macro records, starts one runner per instance, and
//! routes management requests (public state reads, user commands, deletes)
//! to the right runner. Macro kinds are a closed set: the catalog lists
//! them all, the hub starts the ones with an engine behind them.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use macrohub_domain::cover::CoverMacro;
use macrohub_domain::error::{MacroHubError, NotFoundError};
use macrohub_domain::id::MacroId;
use macrohub_domain::macros::{MacroInfo, MacroLogic, MacroRecord, VersionedPayload};
use macrohub_domain::showcase::MacroKind;

use crate::event_bus::ControlBus;
use crate::ports::{DeviceAdapter, MacroStore};
use crate::runner::{MacroHandle, MacroRunner};

/// Application service managing macro instances end to end.
pub struct MacroHub<S, A> {
    store: S,
    adapter: A,
    bus: Arc<ControlBus>,
    tick: std::time::Duration,
    running: tokio::sync::Mutex<HashMap<MacroId, MacroHandle>>,
}

impl<S, A> MacroHub<S, A>
where
    S: MacroStore + Clone + 'static,
    A: DeviceAdapter + Clone + 'static,
{
    pub fn new(store: S, adapter: A, bus: Arc<ControlBus>, tick: std::time::Duration) -> Self {
        Self {
            store,
            adapter,
            bus,
            tick,
            running: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    /// The macro-type catalog, in display order.
    #[must_use]
    pub fn catalog(&self) -> &'static [MacroKind] {
        &MacroKind::ALL
    }

    /// Create, persist, and start a new macro instance.
    ///
    /// # Errors
    ///
    /// Returns [`MacroHubError::MalformedSettings`] or
    /// [`MacroHubError::Validation`] when the settings payload is unusable,
    /// [`MacroHubError::UnsupportedKind`] for catalog entries without an
    /// engine, or a storage error from the repository.
    #[tracing::instrument(skip_all, fields(kind = %kind, name = %name))]
    pub async fn create_macro(
        &self,
        kind: MacroKind,
        name: String,
        description: String,
        labels: Vec<String>,
        settings: VersionedPayload,
    ) -> Result<MacroInfo, MacroHubError> {
        let record = MacroRecord {
            info: MacroInfo {
                id: MacroId::new(),
                kind,
                name,
                description,
                labels,
            },
            settings,
            state: None,
        };

        // Starting first validates the settings; nothing is persisted for a
        // macro that cannot run.
        let handle = self.start(&record)?;
        let record = match self.store.create(record).await {
            Ok(record) => record,
            Err(err) => {
                handle.destroy().await;
                return Err(err);
            }
        };
        self.running.lock().await.insert(record.info.id, handle);
        tracing::info!(id = %record.info.id, "macro created");
        Ok(record.info)
    }

    /// Start runners for every persisted macro, typically at boot.
    ///
    /// A record whose settings no longer parse is logged and skipped; the
    /// remaining macros still start.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the records cannot be listed.
    pub async fn start_persisted(&self) -> Result<usize, MacroHubError> {
        let records = self.store.list().await?;
        let mut running = self.running.lock().await;
        let mut started = 0;
        for record in records {
            if running.contains_key(&record.info.id) {
                continue;
            }
            match self.start(&record) {
                Ok(handle) => {
                    running.insert(record.info.id, handle);
                    started += 1;
                }
                Err(err) => {
                    tracing::error!(%err, id = %record.info.id, "macro failed to start");
                }
            }
        }
        Ok(started)
    }

    /// Look up a macro's metadata.
    ///
    /// # Errors
    ///
    /// Returns [`MacroHubError::NotFound`] when no record with `id` exists,
    /// or a storage error from the repository.
    pub async fn get_macro(&self, id: MacroId) -> Result<MacroInfo, MacroHubError> {
        self.store
            .get(id)
            .await?
            .map(|record| record.info)
            .ok_or_else(|| not_found(id))
    }

    /// List the metadata of every persisted macro.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the repository.
    pub async fn list_macros(&self) -> Result<Vec<MacroInfo>, MacroHubError> {
        let records = self.store.list().await?;
        Ok(records.into_iter().map(|record| record.info).collect())
    }

    /// Read the public projection of a running macro.
    ///
    /// # Errors
    ///
    /// Returns [`MacroHubError::NotFound`] when the macro is not running.
    pub async fn public_state(&self, id: MacroId) -> Result<Value, MacroHubError> {
        self.handle(id).await?.public_state().await
    }

    /// Forward a user-initiated public-state change to a running macro.
    /// Returns whether the macro accepted it.
    ///
    /// # Errors
    ///
    /// Returns [`MacroHubError::NotFound`] when the macro is not running.
    pub async fn apply_public_state(
        &self,
        id: MacroId,
        update: Value,
    ) -> Result<bool, MacroHubError> {
        self.handle(id).await?.apply_public_state(update).await
    }

    /// Stop a macro and remove its record.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_macro(&self, id: MacroId) -> Result<(), MacroHubError> {
        if let Some(handle) = self.running.lock().await.remove(&id) {
            handle.destroy().await;
        }
        self.store.delete(id).await?;
        tracing::info!("macro deleted");
        Ok(())
    }

    /// Stop every running macro without touching the records.
    pub async fn shutdown(&self) {
        let handles: Vec<MacroHandle> = self.running.lock().await.drain().map(|(_, h)| h).collect();
        for handle in handles {
            handle.destroy().await;
        }
    }

    async fn handle(&self, id: MacroId) -> Result<MacroHandle, MacroHubError> {
        self.running
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    fn start(&self, record: &MacroRecord) -> Result<MacroHandle, MacroHubError> {
        match record.info.kind {
            MacroKind::Cover => self.start_logic::<CoverMacro>(record),
            other => Err(MacroHubError::UnsupportedKind(other)),
        }
    }

    fn start_logic<L: MacroLogic + Sync>(&self, record: &MacroRecord) -> Result<MacroHandle, MacroHubError>
    where
        L::Output: Sync,
    {
        let settings = L::parse_settings(&record.settings.payload, record.settings.version)?;
        let state = L::parse_state(record.state.as_ref().map(|s| s.payload.as_str()));
        let logic = L::new(settings, state);
        let runner = MacroRunner::new(
            record.info.id,
            logic,
            self.adapter.clone(),
            self.store.clone(),
            self.bus.subscribe(),
        );
        Ok(runner.spawn(self.tick))
    }
}

fn not_found(id: MacroId) -> MacroHubError {
    NotFoundError {
        entity: "macro",
        id: id.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ControlPublisher;
    use crate::test_support::{InMemoryMacroStore, SpyAdapter};
    use macrohub_domain::control::{
        ControlPayload, ControlRef, ControlType, ControlValue,
    };
    use macrohub_domain::cover::settings::{
        CloseBySun, CoverSettings, IlluminationSettings, LevelDetection, ManualStrategy,
        MotionSettings, NoiseSettings, PositionControl, StateControl, SwitchingBoundary,
        TemperatureSettings,
    };
    use macrohub_domain::time::now;

    fn reference(device: &str, control: &str, control_type: ControlType) -> ControlRef {
        ControlRef {
            device_id: device.to_string(),
            control_id: control.to_string(),
            control_type,
        }
    }

    fn cover_settings() -> CoverSettings {
        CoverSettings {
            switchers: Vec::new(),
            manual_block_min: 15,
            manual_strategy: ManualStrategy::Toggle,
            illuminations: vec![reference("wb-ms-1", "lux", ControlType::Illumination)],
            motions: vec![reference("wb-ms-1", "motion", ControlType::Value)],
            noises: Vec::new(),
            temperatures: Vec::new(),
            state: StateControl {
                control: reference("curtain-1", "state", ControlType::Enum),
                open: "OPEN".to_string(),
                close: "CLOSE".to_string(),
                stop: "STOP".to_string(),
            },
            position: PositionControl {
                control: reference("curtain-1", "position", ControlType::Value),
                open: 100.0,
                close: 0.0,
            },
            illumination: IlluminationSettings {
                detection: LevelDetection::Max,
                switching_boundaries: vec![SwitchingBoundary {
                    close: 25.0,
                    open: 150.0,
                }],
            },
            motion: MotionSettings {
                detection: LevelDetection::Max,
                trigger: 10.0,
            },
            noise: NoiseSettings {
                detection: LevelDetection::Max,
                trigger: 35.0,
            },
            temperature: TemperatureSettings {
                detection: LevelDetection::Max,
            },
            silence_min: 0,
            open_close_by_time: Vec::new(),
            close_by_sun: CloseBySun {
                illumination: 3000.0,
                temperature: 28.0,
                position: 40.0,
            },
            blocks: Vec::new(),
        }
    }

    fn cover_payload() -> VersionedPayload {
        VersionedPayload {
            version: CoverMacro::VERSION,
            payload: serde_json::to_string(&cover_settings()).unwrap(),
        }
    }

    fn hub() -> (
        MacroHub<Arc<InMemoryMacroStore>, Arc<SpyAdapter>>,
        Arc<ControlBus>,
        Arc<SpyAdapter>,
    ) {
        let bus = Arc::new(ControlBus::new(16));
        let adapter = Arc::new(SpyAdapter::default());
        let hub = MacroHub::new(
            Arc::new(InMemoryMacroStore::default()),
            Arc::clone(&adapter),
            Arc::clone(&bus),
            std::time::Duration::from_secs(3600),
        );
        (hub, bus, adapter)
    }

    async fn create_cover(
        hub: &MacroHub<Arc<InMemoryMacroStore>, Arc<SpyAdapter>>,
    ) -> MacroInfo {
        hub.create_macro(
            MacroKind::Cover,
            "Living room curtain".to_string(),
            String::new(),
            vec!["ground-floor".to_string()],
            cover_payload(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn should_create_and_list_macro() {
        let (hub, _bus, _adapter) = hub();
        let info = create_cover(&hub).await;

        let listed = hub.list_macros().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, info.id);
        assert_eq!(listed[0].kind, MacroKind::Cover);

        let fetched = hub.get_macro(info.id).await.unwrap();
        assert_eq!(fetched.name, "Living room curtain");
    }

    #[tokio::test]
    async fn should_reject_kind_without_an_engine() {
        let (hub, _bus, _adapter) = hub();
        let result = hub
            .create_macro(
                MacroKind::Heating,
                "Boiler".to_string(),
                String::new(),
                Vec::new(),
                cover_payload(),
            )
            .await;
        assert!(matches!(result, Err(MacroHubError::UnsupportedKind(_))));
        assert!(hub.list_macros().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_not_persist_macro_with_malformed_settings() {
        let (hub, _bus, _adapter) = hub();
        let result = hub
            .create_macro(
                MacroKind::Cover,
                "Broken".to_string(),
                String::new(),
                Vec::new(),
                VersionedPayload {
                    version: CoverMacro::VERSION,
                    payload: "{broken".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(MacroHubError::MalformedSettings(_))));
        assert!(hub.list_macros().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_expose_public_state_of_running_macro() {
        let (hub, _bus, _adapter) = hub();
        let info = create_cover(&hub).await;

        let state = hub.public_state(info.id).await.unwrap();
        assert_eq!(state["state"], "STOP");
        assert_eq!(state["position"], 100.0);
    }

    #[tokio::test]
    async fn should_dispatch_command_for_accepted_public_state() {
        let (hub, _bus, adapter) = hub();
        let info = create_cover(&hub).await;

        let accepted = hub
            .apply_public_state(info.id, serde_json::json!({"state": "CLOSE"}))
            .await
            .unwrap();
        assert!(accepted);

        let state = hub.public_state(info.id).await.unwrap();
        assert_eq!(state["state"], "CLOSE");

        let sent = adapter.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].payload, ControlPayload::Discrete("CLOSE".to_string()));
    }

    #[tokio::test]
    async fn should_react_to_values_on_the_bus() {
        let (hub, bus, adapter) = hub();
        let info = create_cover(&hub).await;

        let lux = reference("wb-ms-1", "lux", ControlType::Illumination);
        bus.publish(ControlValue::new(&lux, ControlPayload::Analog(10.0), now()))
            .await
            .unwrap();

        // public_state is answered by the runner after the bus value, so the
        // close decision has been dispatched by the time it returns.
        let state = hub.public_state(info.id).await.unwrap();
        assert_eq!(state["state"], "CLOSE");
        assert_eq!(adapter.sent().len(), 1);
    }

    #[tokio::test]
    async fn should_delete_macro_and_stop_its_runner() {
        let (hub, _bus, _adapter) = hub();
        let info = create_cover(&hub).await;

        hub.delete_macro(info.id).await.unwrap();

        assert!(hub.list_macros().await.unwrap().is_empty());
        assert!(matches!(
            hub.public_state(info.id).await,
            Err(MacroHubError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn should_start_persisted_macros() {
        let (hub, _bus, _adapter) = hub();
        let info = create_cover(&hub).await;
        hub.shutdown().await;
        assert!(matches!(
            hub.public_state(info.id).await,
            Err(MacroHubError::NotFound(_))
        ));

        let started = hub.start_persisted().await.unwrap();
        assert_eq!(started, 1);
        assert!(hub.public_state(info.id).await.is_ok());
    }

    #[tokio::test]
    async fn should_list_full_catalog() {
        let (hub, _bus, _adapter) = hub();
        let catalog = hub.catalog();
        assert_eq!(catalog.len(), 14);
        assert!(catalog.contains(&MacroKind::Cover));
    }
}
