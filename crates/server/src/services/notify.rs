//! Best-effort order notifications.
//!
//! The lifecycle service reports order events through [`OrderNotifier`];
//! every delivery channel behind it (email, persisted notifications, the
//! in-process event hub) is best-effort: failures are logged and never
//! propagate back into the order write.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::warn;

use ecoshop_core::OrderStatus;

use crate::db::NotificationRepository;
use crate::db::notifications::NewNotification;
use crate::models::order::{Order, OrderItem};
use crate::services::email::EmailService;
use crate::services::events::{AppEvent, EventHub};

/// Customer-facing copy for a status change, if the status warrants one.
///
/// Returns `(kind, title, message)`; `pending` produces nothing because the
/// creation path already sends the confirmation email.
#[must_use]
pub fn status_notification(status: OrderStatus, order_number: &str) -> Option<(String, String, String)> {
    let (title, message) = match status {
        OrderStatus::Pending => return None,
        OrderStatus::Confirmed => (
            "Order Confirmed",
            format!("Your order {order_number} has been confirmed and is being prepared."),
        ),
        OrderStatus::Processing => (
            "Order Processing",
            format!("Your order {order_number} is being processed."),
        ),
        OrderStatus::Shipped => (
            "Order Shipped",
            format!("Your order {order_number} has been shipped and is on its way!"),
        ),
        OrderStatus::Delivered => (
            "Order Delivered",
            format!("Your order {order_number} has been delivered. Enjoy your purchase!"),
        ),
        OrderStatus::Cancelled => (
            "Order Cancelled",
            format!("Your order {order_number} has been cancelled."),
        ),
    };

    Some((format!("order_{status}"), title.to_owned(), message))
}

/// Sink for order lifecycle side effects.
#[async_trait]
pub trait OrderNotifier: Send + Sync {
    /// An order was created.
    async fn order_created(&self, order: &Order, items: &[OrderItem]);

    /// An order moved to a new fulfillment status.
    async fn order_status_changed(&self, order: &Order);

    /// A payment settled (completed or failed).
    async fn payment_settled(&self, order: &Order);
}

/// Production notifier: email + persisted notification + event hub.
pub struct AppNotifier {
    pool: PgPool,
    email: Option<EmailService>,
    events: EventHub,
}

impl AppNotifier {
    /// Create a new notifier. `email` is `None` when SMTP isn't configured;
    /// sends are then skipped with a debug log.
    #[must_use]
    pub const fn new(pool: PgPool, email: Option<EmailService>, events: EventHub) -> Self {
        Self { pool, email, events }
    }

    async fn append_notification(&self, new: NewNotification) {
        let repo = NotificationRepository::new(&self.pool);
        match repo.append(&new).await {
            Ok(notification) => {
                self.events.publish(AppEvent::Notification {
                    user_id: notification.user_id,
                    title: notification.title,
                    message: notification.message,
                });
            }
            Err(e) => {
                warn!(error = %e, user_id = %new.user_id, "failed to persist notification");
            }
        }
    }
}

#[async_trait]
impl OrderNotifier for AppNotifier {
    async fn order_created(&self, order: &Order, items: &[OrderItem]) {
        if let Some(email) = &self.email {
            if let Err(e) = email.send_order_confirmation(order, items).await {
                warn!(
                    error = %e,
                    order_number = %order.order_number,
                    "failed to send order confirmation email"
                );
            }
        } else {
            tracing::debug!(
                order_number = %order.order_number,
                "SMTP not configured, skipping confirmation email"
            );
        }

        self.append_notification(NewNotification {
            user_id: order.user_id,
            kind: "order_placed".to_owned(),
            title: "Order Placed Successfully".to_owned(),
            message: format!(
                "Your order {} has been placed successfully.",
                order.order_number
            ),
            link: Some("/dashboard/orders".to_owned()),
        })
        .await;
    }

    async fn order_status_changed(&self, order: &Order) {
        self.events.publish(AppEvent::OrderStatusChanged {
            order_id: order.id,
            order_number: order.order_number.to_string(),
            status: order.status,
        });

        let Some((kind, title, message)) =
            status_notification(order.status, order.order_number.as_str())
        else {
            return;
        };

        if let Some(email) = &self.email
            && let Err(e) = email.send_status_update(order, &title, &message).await
        {
            warn!(
                error = %e,
                order_number = %order.order_number,
                "failed to send order status email"
            );
        }

        self.append_notification(NewNotification {
            user_id: order.user_id,
            kind,
            title,
            message,
            link: Some("/dashboard/orders".to_owned()),
        })
        .await;
    }

    async fn payment_settled(&self, order: &Order) {
        self.events.publish(AppEvent::PaymentSettled {
            order_id: order.id,
            order_number: order.order_number.to_string(),
            payment_status: order.payment_status,
        });

        // Settlement also moves the order status (confirmed or cancelled);
        // reuse the status copy for the persisted notification.
        self.order_status_changed(order).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_notification_copy() {
        let (kind, title, message) =
            status_notification(OrderStatus::Shipped, "ORD-1").expect("copy");
        assert_eq!(kind, "order_shipped");
        assert_eq!(title, "Order Shipped");
        assert!(message.contains("ORD-1"));
        assert!(message.contains("on its way"));
    }

    #[test]
    fn test_pending_has_no_notification() {
        assert!(status_notification(OrderStatus::Pending, "ORD-1").is_none());
    }

    #[test]
    fn test_all_non_pending_statuses_have_copy() {
        for status in OrderStatus::ALL {
            if status == OrderStatus::Pending {
                continue;
            }
            let (kind, _, message) = status_notification(status, "ORD-9").expect("copy");
            assert_eq!(kind, format!("order_{status}"));
            assert!(message.contains("ORD-9"));
        }
    }
}
