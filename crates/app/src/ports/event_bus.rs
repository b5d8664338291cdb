//! Event-bus port — pushing control values into the hub.

use std::future::Future;

use macrohub_domain::control::ControlValue;
use macrohub_domain::error::MacroHubError;

/// Outbound port for device adapters reporting control values.
pub trait ControlPublisher: Send + Sync {
    /// Publish one control value to every subscribed macro.
    fn publish(&self, value: ControlValue) -> impl Future<Output = Result<(), MacroHubError>> + Send;
}

impl<T: ControlPublisher> ControlPublisher for std::sync::Arc<T> {
    fn publish(&self, value: ControlValue) -> impl Future<Output = Result<(), MacroHubError>> + Send {
        T::publish(self, value)
    }
}
