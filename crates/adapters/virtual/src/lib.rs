//! # macrohub-adapter-virtual
//!
//! Virtual/demo device adapter that provides simulated devices for testing
//! and demonstration purposes.
//!
//! The adapter accepts every command and records it. With an attached bus
//! it also echoes accepted commands back as control values, the way a real
//! device reports its own state after moving. [`VirtualSensor`] and
//! [`VirtualSwitch`] feed simulated readings and button presses onto the
//! bus.
//!
//! ## Dependency rule
//!
//! Depends on `macrohub-app` (port traits) and `macrohub-domain` only.

use std::sync::{Arc, Mutex};

use macrohub_app::event_bus::ControlBus;
use macrohub_app::ports::{ControlPublisher, DeviceAdapter};
use macrohub_domain::control::{
    Command, ControlPayload, ControlRef, ControlValue, SwitchState,
};
use macrohub_domain::error::{DispatchFailure, MacroHubError};
use macrohub_domain::time::now;

/// Simulated device layer recording every accepted command.
pub struct VirtualDeviceAdapter {
    accepted: Mutex<Vec<Command>>,
    echo: Option<Arc<ControlBus>>,
}

impl Default for VirtualDeviceAdapter {
    fn default() -> Self {
        Self {
            accepted: Mutex::new(Vec::new()),
            echo: None,
        }
    }
}

impl VirtualDeviceAdapter {
    /// Adapter that echoes accepted commands back onto `bus` as control
    /// values, simulating device state feedback.
    #[must_use]
    pub fn with_echo(bus: Arc<ControlBus>) -> Self {
        Self {
            accepted: Mutex::new(Vec::new()),
            echo: Some(bus),
        }
    }

    /// Every command accepted so far, in dispatch order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn accepted(&self) -> Vec<Command> {
        self.accepted.lock().expect("adapter lock poisoned").clone()
    }

    /// The last payload accepted for one `(device, control)` address.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn last_payload(&self, device_id: &str, control_id: &str) -> Option<ControlPayload> {
        self.accepted
            .lock()
            .expect("adapter lock poisoned")
            .iter()
            .rev()
            .find(|command| command.device_id == device_id && command.control_id == control_id)
            .map(|command| command.payload.clone())
    }
}

impl DeviceAdapter for VirtualDeviceAdapter {
    async fn dispatch(&self, command: Command) -> Result<(), DispatchFailure> {
        tracing::debug!(
            device_id = %command.device_id,
            control_id = %command.control_id,
            "virtual device accepted command"
        );
        let echoed = ControlValue {
            device_id: command.device_id.clone(),
            control_id: command.control_id.clone(),
            control_type: command.control_type,
            payload: command.payload.clone(),
            timestamp: now(),
        };
        if let Ok(mut accepted) = self.accepted.lock() {
            accepted.push(command);
        }
        if let Some(bus) = &self.echo {
            // In-process publishing cannot fail.
            let _ = bus.publish(echoed).await;
        }
        Ok(())
    }
}

/// A simulated analog sensor bound to one control reference.
pub struct VirtualSensor {
    reference: ControlRef,
}

impl VirtualSensor {
    #[must_use]
    pub fn new(reference: ControlRef) -> Self {
        Self { reference }
    }

    /// Publish one reading onto the bus.
    ///
    /// # Errors
    ///
    /// Propagates a bus publishing failure.
    pub async fn report(&self, bus: &ControlBus, level: f64) -> Result<(), MacroHubError> {
        bus.publish(ControlValue::new(
            &self.reference,
            ControlPayload::Analog(level),
            now(),
        ))
        .await
    }
}

/// A simulated wall button bound to one switch control.
pub struct VirtualSwitch {
    reference: ControlRef,
}

impl VirtualSwitch {
    #[must_use]
    pub fn new(reference: ControlRef) -> Self {
        Self { reference }
    }

    /// Publish one switch level onto the bus.
    ///
    /// # Errors
    ///
    /// Propagates a bus publishing failure.
    pub async fn set(&self, bus: &ControlBus, level: SwitchState) -> Result<(), MacroHubError> {
        bus.publish(ControlValue::new(
            &self.reference,
            ControlPayload::Switch(level),
            now(),
        ))
        .await
    }

    /// Simulate a full press: down to `ON`, back up to `OFF`.
    ///
    /// # Errors
    ///
    /// Propagates a bus publishing failure.
    pub async fn press(&self, bus: &ControlBus) -> Result<(), MacroHubError> {
        self.set(bus, SwitchState::On).await?;
        self.set(bus, SwitchState::Off).await
    }
}
