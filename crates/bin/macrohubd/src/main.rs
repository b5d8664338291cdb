//! # macrohubd — macrohub daemon
//!
//! Composition root that wires all adapters together and runs the hub.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct the macro store and device adapter
//! - Construct the control bus and the macro hub
//! - Restart every persisted macro
//! - Handle graceful shutdown (SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

use std::sync::Arc;

use macrohub_adapter_storage_sqlite_sqlx::{Config as DbConfig, SqliteMacroStore};
use macrohub_adapter_virtual::VirtualDeviceAdapter;
use macrohub_app::event_bus::ControlBus;
use macrohub_app::hub::MacroHub;
use tracing_subscriber::EnvFilter;

mod config;

use config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Database
    let db = DbConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let store = Arc::new(SqliteMacroStore::new(db.pool().clone()));

    // Control bus
    let bus = Arc::new(ControlBus::new(config.hub.bus_capacity));

    // Device layer. The virtual adapter echoes accepted commands back onto
    // the bus when enabled, so macros observe their own device feedback.
    let adapter = if config.integrations.virtual_enabled {
        Arc::new(VirtualDeviceAdapter::with_echo(Arc::clone(&bus)))
    } else {
        Arc::new(VirtualDeviceAdapter::default())
    };

    // Hub
    let hub = MacroHub::new(store, adapter, Arc::clone(&bus), config.tick());
    let started = hub.start_persisted().await?;
    tracing::info!(started, "macrohubd running");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    hub.shutdown().await;

    Ok(())
}
