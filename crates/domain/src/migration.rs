//! Versioned settings parsing with an ordered migration chain.
//!
//! Settings travel as version-tagged serialized text. When the stored
//! version is older than the macro's current one, an ordered list of pure
//! transforms is applied left-to-right, one per intervening version, before
//! the final decode. When versions match the chain is empty and parsing is
//! plain decoding.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::MalformedSettings;

/// One migration step: takes the decoded shape of version `n` and produces
/// the shape of version `n + 1`.
pub type MigrationStep = fn(Value) -> Result<Value, String>;

/// Decode `raw` stored at `from_version`, migrating through `steps` up to
/// `current_version`.
///
/// `steps[n]` migrates version `n` to `n + 1`, so a macro at version `V`
/// supplies exactly `V` steps.
///
/// # Errors
///
/// Returns [`MalformedSettings`] when the payload does not decode, when no
/// migration path exists (stored version newer than current, or a step
/// missing), or when a step fails.
pub fn parse_versioned<S: DeserializeOwned>(
    raw: &str,
    from_version: u32,
    current_version: u32,
    steps: &[MigrationStep],
) -> Result<S, MalformedSettings> {
    if from_version > current_version || (steps.len() as u32) < current_version {
        return Err(MalformedSettings::NoMigrationPath {
            from: from_version,
            to: current_version,
        });
    }

    let mut value: Value = serde_json::from_str(raw).map_err(MalformedSettings::Decode)?;

    for version in from_version..current_version {
        let step = steps[version as usize];
        value = step(value).map_err(|reason| MalformedSettings::Migration { version, reason })?;
    }

    serde_json::from_value(value).map_err(MalformedSettings::Decode)
}
