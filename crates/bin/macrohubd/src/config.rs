//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `macrohub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Hub runtime settings.
    pub hub: HubConfig,
    /// Integration toggles.
    pub integrations: IntegrationsConfig,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Macro hub runtime configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Capacity of the control value bus.
    pub bus_capacity: usize,
    /// Seconds between time-driven evaluations of each macro.
    pub tick_seconds: u64,
}

/// Per-integration toggles.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IntegrationsConfig {
    /// Enable the virtual/demo device layer.
    pub virtual_enabled: bool,
}

impl Config {
    /// Load configuration from `macrohub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("macrohub.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MACROHUB_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("MACROHUB_TICK_SECONDS") {
            if let Ok(seconds) = val.parse() {
                self.hub.tick_seconds = seconds;
            }
        }
        if let Ok(val) = std::env::var("MACROHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.hub.bus_capacity == 0 {
            return Err(ConfigError::Validation(
                "hub.bus_capacity must be non-zero".to_string(),
            ));
        }
        if self.hub.tick_seconds == 0 {
            return Err(ConfigError::Validation(
                "hub.tick_seconds must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Return the interval between time-driven evaluations.
    #[must_use]
    pub fn tick(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.hub.tick_seconds)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:macrohub.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "macrohubd=info,macrohub=info".to_string(),
        }
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            bus_capacity: 256,
            tick_seconds: 30,
        }
    }
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            virtual_enabled: true,
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Validation(String),
}
