//! Device-adapter port — command dispatch toward physical devices.

use std::future::Future;

use macrohub_domain::control::Command;
use macrohub_domain::error::DispatchFailure;

/// Outbound port carrying macro output commands to the device layer.
///
/// Failures are reported back for observability; the rule engine never
/// retries a command itself — the next cycle re-evaluates and may issue
/// the same or a superseding one.
pub trait DeviceAdapter: Send + Sync {
    /// Send one command. Resolves once the adapter has accepted it.
    fn dispatch(&self, command: Command) -> impl Future<Output = Result<(), DispatchFailure>> + Send;
}

impl<T: DeviceAdapter> DeviceAdapter for std::sync::Arc<T> {
    fn dispatch(&self, command: Command) -> impl Future<Output = Result<(), DispatchFailure>> + Send {
        T::dispatch(self, command)
    }
}
