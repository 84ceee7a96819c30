//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use ecoshop_core::{Email, OrderId, OrderItemId, OrderNumber, OrderStatus, PaymentStatus, ProductId, UserId};

/// A customer order.
///
/// `status` and `payment_status` are tracked independently: the payment
/// simulator settles `payment_status` exactly once, while `status` walks the
/// fulfillment lifecycle.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub user_id: UserId,
    pub customer_name: String,
    pub customer_email: Email,
    pub total: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_address: String,
    pub payment_method: String,
    pub coupon_code: Option<String>,
    pub coupon_discount: Option<Decimal>,
    /// Gateway correlation id (checkout request id) once a payment started.
    pub checkout_request_id: Option<String>,
    /// Gateway receipt id once the payment completed.
    pub receipt_number: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item, denormalized at purchase time.
///
/// Owned by its order; deleted with it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Decimal,
    pub quantity: i32,
}

impl OrderItem {
    /// Price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// An order with its line items.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// One checkpoint of the tracking timeline.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrackingStep {
    pub status: OrderStatus,
    pub label: &'static str,
    pub completed: bool,
    pub active: bool,
}
