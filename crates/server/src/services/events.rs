//! In-process event hub.
//!
//! Order lifecycle changes and new notifications are published here so that
//! live-push subscribers (e.g. a websocket layer in front of this API) can
//! react without polling. The hub is a plain broadcast channel; delivery is
//! best-effort and lagging subscribers miss events rather than block writers.

use serde::Serialize;
use tokio::sync::broadcast;

use ecoshop_core::{OrderId, OrderStatus, PaymentStatus, UserId};

const EVENT_CAPACITY: usize = 256;

/// An event published by the domain services.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum AppEvent {
    /// A persisted notification was appended for a user.
    #[serde(rename_all = "camelCase")]
    Notification {
        user_id: UserId,
        title: String,
        message: String,
    },
    /// An order moved through its fulfillment lifecycle.
    #[serde(rename_all = "camelCase")]
    OrderStatusChanged {
        order_id: OrderId,
        order_number: String,
        status: OrderStatus,
    },
    /// A payment settled (completed or failed).
    #[serde(rename_all = "camelCase")]
    PaymentSettled {
        order_id: OrderId,
        order_number: String,
        payment_status: PaymentStatus,
    },
}

/// Broadcast hub for [`AppEvent`]s.
#[derive(Debug, Clone)]
pub struct EventHub {
    sender: broadcast::Sender<AppEvent>,
}

impl EventHub {
    /// Create a new hub.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    /// Publish an event. Returns the number of current subscribers.
    pub fn publish(&self, event: AppEvent) -> usize {
        // send only errors when there are no receivers; that's fine.
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to the event stream.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let hub = EventHub::new();
        let mut rx = hub.subscribe();

        hub.publish(AppEvent::OrderStatusChanged {
            order_id: OrderId::new(1),
            order_number: "ORD-20260807-AAAA1111".to_owned(),
            status: OrderStatus::Shipped,
        });

        let event = rx.recv().await.expect("event");
        match event {
            AppEvent::OrderStatusChanged { status, .. } => {
                assert_eq!(status, OrderStatus::Shipped);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let hub = EventHub::new();
        let delivered = hub.publish(AppEvent::Notification {
            user_id: UserId::new(1),
            title: "t".to_owned(),
            message: "m".to_owned(),
        });
        assert_eq!(delivered, 0);
    }
}
