//! # macrohub-app
//!
//! Application layer — macro orchestration and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `MacroStore` — persistence for macro records, settings, and state snapshots
//!   - `DeviceAdapter` — command dispatch to physical devices
//!   - `ControlPublisher` — pushing control values onto the bus
//! - Provide **in-process infrastructure** (the control-value bus) that needs no IO
//! - Run macro instances: one sequential task per instance, idempotent command
//!   dispatch, state persistence after every accepted change
//! - Expose the hub service that the management surface and daemon drive
//!
//! ## Dependency rule
//! Depends on `macrohub-domain` only (plus `tokio::sync`/`tokio::time` for
//! channels and ticks). Never imports adapter crates. Adapters depend on
//! *this* crate, not the reverse.

pub mod event_bus;
pub mod hub;
pub mod ports;
pub mod runner;

#[cfg(test)]
pub(crate) mod test_support;
