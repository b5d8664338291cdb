//! In-process control-value bus backed by a tokio broadcast channel.

use std::future::Future;

use tokio::sync::broadcast;

use macrohub_domain::control::ControlValue;
use macrohub_domain::error::MacroHubError;

use crate::ports::ControlPublisher;

/// In-process bus fanning control values out to macro instances.
///
/// Publishing succeeds even when there are no active subscribers
/// (the value is simply dropped). Filtering down to the controls a macro
/// actually observes happens in the macro, not on the bus.
pub struct ControlBus {
    sender: broadcast::Sender<ControlValue>,
}

impl ControlBus {
    /// Create a new bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to values published *after* this call.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: Some(self.sender.subscribe()),
        }
    }
}

impl ControlPublisher for ControlBus {
    fn publish(&self, value: ControlValue) -> impl Future<Output = Result<(), MacroHubError>> + Send {
        // broadcast::send fails only when there are zero receivers,
        // which is fine — we simply ignore the error.
        let _ = self.sender.send(value);
        async { Ok(()) }
    }
}

/// A live subscription to the bus.
///
/// Released explicitly with [`release`](Self::release) or implicitly on
/// drop; releasing twice is a no-op.
pub struct Subscription {
    receiver: Option<broadcast::Receiver<ControlValue>>,
}

impl Subscription {
    /// Wait for the next value. Returns `None` once the subscription is
    /// released or the bus is gone. A lagging receiver skips the overwritten
    /// values and keeps going.
    pub async fn recv(&mut self) -> Option<ControlValue> {
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.recv().await {
                Ok(value) => return Some(value),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "subscription lagged, dropping oldest values");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Drop the underlying receiver, ending delivery immediately.
    pub fn release(&mut self) {
        self.receiver = None;
    }

    /// Whether [`release`](Self::release) has been called.
    #[must_use]
    pub fn released(&self) -> bool {
        self.receiver.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use macrohub_domain::control::{ControlPayload, ControlRef, ControlType};
    use macrohub_domain::time::now;

    fn lux_value(level: f64) -> ControlValue {
        let reference = ControlRef {
            device_id: "wb-ms-1".to_string(),
            control_id: "lux".to_string(),
            control_type: ControlType::Illumination,
        };
        ControlValue::new(&reference, ControlPayload::Analog(level), now())
    }

    #[tokio::test]
    async fn should_deliver_value_to_subscriber() {
        let bus = ControlBus::new(16);
        let mut subscription = bus.subscribe();

        bus.publish(lux_value(120.0)).await.unwrap();

        let received = subscription.recv().await.unwrap();
        assert_eq!(received.payload, ControlPayload::Analog(120.0));
    }

    #[tokio::test]
    async fn should_deliver_value_to_multiple_subscribers() {
        let bus = ControlBus::new(16);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(lux_value(80.0)).await.unwrap();

        assert!(first.recv().await.is_some());
        assert!(second.recv().await.is_some());
    }

    #[tokio::test]
    async fn should_succeed_when_no_subscribers() {
        let bus = ControlBus::new(16);
        assert!(bus.publish(lux_value(80.0)).await.is_ok());
    }

    #[tokio::test]
    async fn should_not_deliver_values_published_before_subscription() {
        let bus = ControlBus::new(16);
        bus.publish(lux_value(1.0)).await.unwrap();

        let mut subscription = bus.subscribe();
        bus.publish(lux_value(2.0)).await.unwrap();

        let received = subscription.recv().await.unwrap();
        assert_eq!(received.payload, ControlPayload::Analog(2.0));
    }

    #[tokio::test]
    async fn should_stop_delivering_after_release() {
        let bus = ControlBus::new(16);
        let mut subscription = bus.subscribe();

        subscription.release();
        bus.publish(lux_value(1.0)).await.unwrap();

        assert!(subscription.recv().await.is_none());
    }

    #[tokio::test]
    async fn should_tolerate_double_release() {
        let bus = ControlBus::new(16);
        let mut subscription = bus.subscribe();
        subscription.release();
        subscription.release();
        assert!(subscription.released());
    }
}
