//! `SQLite` implementation of the `MacroStore` port.

use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use macrohub_app::ports::MacroStore;
use macrohub_domain::error::MacroHubError;
use macrohub_domain::id::MacroId;
use macrohub_domain::macros::{MacroInfo, MacroRecord, VersionedPayload};
use macrohub_domain::showcase::MacroKind;

use crate::error::StorageError;

struct Wrapper(MacroRecord);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<MacroRecord> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let kind_json: String = row.try_get("kind")?;
        let name: String = row.try_get("name")?;
        let description: String = row.try_get("description")?;
        let labels_json: String = row.try_get("labels")?;
        let settings_version: i64 = row.try_get("settings_version")?;
        let settings: String = row.try_get("settings")?;
        let state_version: Option<i64> = row.try_get("state_version")?;
        let state: Option<String> = row.try_get("state")?;

        let id = MacroId::from_str(&id).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let kind: MacroKind =
            serde_json::from_str(&kind_json).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let labels: Vec<String> = serde_json::from_str(&labels_json)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let state = match (state_version, state) {
            (Some(version), Some(payload)) => Some(VersionedPayload {
                version: u32::try_from(version)
                    .map_err(|err| sqlx::Error::Decode(Box::new(err)))?,
                payload,
            }),
            _ => None,
        };

        Ok(Self(MacroRecord {
            info: MacroInfo {
                id,
                kind,
                name,
                description,
                labels,
            },
            settings: VersionedPayload {
                version: u32::try_from(settings_version)
                    .map_err(|err| sqlx::Error::Decode(Box::new(err)))?,
                payload: settings,
            },
            state,
        }))
    }
}

/// `SQLite`-backed macro store.
pub struct SqliteMacroStore {
    pool: SqlitePool,
}

impl SqliteMacroStore {
    /// Create a new store backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl MacroStore for SqliteMacroStore {
    async fn create(&self, record: MacroRecord) -> Result<MacroRecord, MacroHubError> {
        let kind_json = serde_json::to_string(&record.info.kind).map_err(StorageError::from)?;
        let labels_json = serde_json::to_string(&record.info.labels).map_err(StorageError::from)?;

        sqlx::query(
                "INSERT INTO macros (id, kind, name, description, labels, settings_version, settings, state_version, state) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(record.info.id.to_string())
            .bind(&kind_json)
            .bind(&record.info.name)
            .bind(&record.info.description)
            .bind(&labels_json)
            .bind(i64::from(record.settings.version))
            .bind(&record.settings.payload)
            .bind(record.state.as_ref().map(|s| i64::from(s.version)))
            .bind(record.state.as_ref().map(|s| s.payload.as_str()))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(record)
    }

    async fn get(&self, id: MacroId) -> Result<Option<MacroRecord>, MacroHubError> {
        let row: Option<Wrapper> = sqlx::query_as("SELECT * FROM macros WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }

    async fn list(&self) -> Result<Vec<MacroRecord>, MacroHubError> {
        let rows: Vec<Wrapper> = sqlx::query_as("SELECT * FROM macros ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn save_state(&self, id: MacroId, state: VersionedPayload) -> Result<(), MacroHubError> {
        sqlx::query("UPDATE macros SET state_version = ?, state = ? WHERE id = ?")
            .bind(i64::from(state.version))
            .bind(&state.payload)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }

    async fn delete(&self, id: MacroId) -> Result<(), MacroHubError> {
        sqlx::query("DELETE FROM macros WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }
}
