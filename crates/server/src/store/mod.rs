//! Typed storage interface for the order/inventory/payment core.
//!
//! The order lifecycle has the only multi-write invariants in the system
//! (stock decrement + order insert must be atomic; payment settlement must
//! be applied at most once), so it goes through an explicit [`OrderStore`]
//! interface instead of ad-hoc queries. [`postgres::PgOrderStore`] is the
//! production implementation; tests use an in-memory double.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use ecoshop_core::{Email, OrderId, OrderNumber, OrderStatus, ProductId, UserId};

use crate::models::coupon::Coupon;
use crate::models::order::{Order, OrderWithItems};
use crate::models::product::Product;

pub use postgres::PgOrderStore;

/// Errors from order storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A product had less stock than the requested quantity.
    #[error("insufficient stock for \"{name}\": only {available} units available")]
    InsufficientStock {
        product_id: ProductId,
        name: String,
        available: i32,
    },

    /// A referenced product does not exist.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The order does not exist.
    #[error("order not found")]
    OrderNotFound,

    /// The requested status change would move the lifecycle backward.
    #[error("cannot transition order from {from} to {to}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Fields for persisting a new order header.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub user_id: UserId,
    pub customer_name: String,
    pub customer_email: Email,
    pub total: Decimal,
    pub shipping_address: String,
    pub payment_method: String,
    pub coupon_code: Option<String>,
    pub coupon_discount: Option<Decimal>,
}

/// One line item to persist, denormalized at purchase time.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Decimal,
    pub quantity: i32,
}

/// Outcome reported by the payment gateway.
#[derive(Debug, Clone)]
pub struct PaymentResult {
    pub succeeded: bool,
    pub receipt_number: Option<String>,
}

/// What happened when a payment result was applied.
#[derive(Debug)]
pub enum PaymentApplication {
    /// The order was pending and has been settled.
    Applied(Box<Order>),
    /// The order's payment status was already terminal; nothing changed.
    AlreadySettled(Box<Order>),
    /// No order carries this correlation id.
    UnknownCorrelation,
}

/// Storage interface for orders and the inventory they consume.
///
/// Implementations must make [`create_order`](Self::create_order) atomic:
/// either the order, all its items, and every stock decrement are persisted,
/// or nothing is. The stock check is re-validated at decrement time
/// (conditional update), closing the read-then-write race between concurrent
/// orders for the same product.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fetch the products referenced by an order request.
    ///
    /// Missing ids are simply absent from the result; callers decide how to
    /// report them.
    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, StoreError>;

    /// Atomically persist an order with its items and decrement stock.
    async fn create_order(
        &self,
        order: NewOrder,
        items: &[NewOrderItem],
    ) -> Result<OrderWithItems, StoreError>;

    /// Get an order with items by id.
    async fn get(&self, id: OrderId) -> Result<Option<OrderWithItems>, StoreError>;

    /// Get an order header by its order number.
    async fn get_by_number(&self, order_number: &str) -> Result<Option<Order>, StoreError>;

    /// Get an order header by its gateway correlation id.
    async fn get_by_correlation(&self, correlation_id: &str) -> Result<Option<Order>, StoreError>;

    /// List all orders, newest first (admin surface).
    async fn list_all(&self) -> Result<Vec<OrderWithItems>, StoreError>;

    /// List a user's orders, newest first.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<OrderWithItems>, StoreError>;

    /// Persist a status change, enforcing the lifecycle transition rule.
    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, StoreError>;

    /// Stamp a gateway correlation id onto an order when a payment starts.
    async fn attach_checkout_request(
        &self,
        order_number: &str,
        correlation_id: &str,
        payment_method: &str,
    ) -> Result<Order, StoreError>;

    /// Apply a gateway result to the order carrying `correlation_id`.
    ///
    /// Must be atomic and idempotent: only a `pending` payment status is
    /// ever settled, so re-applying a result (same or conflicting) after
    /// settlement changes nothing.
    async fn apply_payment_result(
        &self,
        correlation_id: &str,
        result: &PaymentResult,
    ) -> Result<PaymentApplication, StoreError>;

    /// Look up a coupon by code (case-insensitive).
    async fn coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, StoreError>;

    /// Record one use of a coupon, bounded by its usage limit.
    ///
    /// Returns `false` when nothing was incremented (unknown code or limit
    /// reached); callers on the order path treat that as a logged anomaly,
    /// not a failure.
    async fn increment_coupon_usage(&self, code: &str) -> Result<bool, StoreError>;
}
