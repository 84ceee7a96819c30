//! Order lifecycle service.
//!
//! Owns the order/inventory/payment core: creation with atomic stock
//! decrement, status transitions, and idempotent payment settlement.
//! Side effects (emails, notifications, events) go through the notifier
//! and are strictly best-effort.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, warn};

use ecoshop_core::{OrderId, OrderNumber, OrderStatus, PaymentStatus, ProductId, UserId};

use crate::error::AppError;
use crate::models::order::{Order, OrderWithItems, TrackingStep};
use crate::models::user::User;
use crate::services::coupons::{check_usable, compute_discount};
use crate::services::notify::OrderNotifier;
use crate::store::{NewOrder, NewOrderItem, OrderStore, PaymentApplication, PaymentResult, StoreError};

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Missing or malformed request fields.
    #[error("{0}")]
    Validation(String),

    /// The requested status is not one of the defined values.
    #[error("Invalid status")]
    InvalidStatus,

    /// The requester may not see this order.
    #[error("Access denied")]
    AccessDenied,

    /// A coupon check failed.
    #[error(transparent)]
    Coupon(#[from] crate::services::coupons::CouponError),

    /// Storage failure (including stock and transition violations).
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Validation(message) => Self::Validation(message),
            OrderError::InvalidStatus => Self::Validation(err.to_string()),
            OrderError::AccessDenied => Self::Forbidden(err.to_string()),
            OrderError::Coupon(inner) => inner.into(),
            OrderError::Store(inner) => inner.into(),
        }
    }
}

/// One requested line of a new order.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Input for creating an order.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub items: Vec<OrderLine>,
    pub shipping_address: String,
    pub payment_method: String,
    pub coupon_code: Option<String>,
}

/// Acknowledgement of a payment callback.
#[derive(Debug)]
pub enum PaymentAck {
    /// The result was applied to a pending payment.
    Applied(Box<Order>),
    /// The result was ignored (unknown correlation id, or already settled).
    Ignored,
}

/// Order lifecycle service over an [`OrderStore`].
pub struct OrderService<S> {
    store: S,
    notifier: Arc<dyn OrderNotifier>,
}

impl<S: Clone> Clone for OrderService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            notifier: Arc::clone(&self.notifier),
        }
    }
}

impl<S: OrderStore> OrderService<S> {
    /// Create a new order service.
    pub fn new(store: S, notifier: Arc<dyn OrderNotifier>) -> Self {
        Self { store, notifier }
    }

    /// Create an order for `user`.
    ///
    /// Every requested product must exist with enough stock; otherwise the
    /// call fails naming the offending product and nothing is created. On
    /// success the order, its items, and the stock decrements are persisted
    /// atomically, and a confirmation email is dispatched best-effort.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Validation` for malformed input or insufficient
    /// stock, `OrderError::Store` for missing products and storage failures,
    /// `OrderError::Coupon` when a supplied coupon is unusable.
    pub async fn create_order(
        &self,
        user: &User,
        request: CreateOrder,
    ) -> Result<OrderWithItems, OrderError> {
        if request.items.is_empty() {
            return Err(OrderError::Validation("Order has no items".to_owned()));
        }
        if request.items.iter().any(|line| line.quantity <= 0) {
            return Err(OrderError::Validation(
                "Item quantity must be positive".to_owned(),
            ));
        }
        if request.shipping_address.trim().is_empty() {
            return Err(OrderError::Validation(
                "Shipping address is required".to_owned(),
            ));
        }
        if request.payment_method.trim().is_empty() {
            return Err(OrderError::Validation(
                "Payment method is required".to_owned(),
            ));
        }

        // Pre-check every line against the catalog. The store re-validates
        // at decrement time; this pass exists to fail early with a precise
        // message and to denormalize name/price.
        let product_ids: Vec<ProductId> =
            request.items.iter().map(|line| line.product_id).collect();
        let products = self.store.products_by_ids(&product_ids).await?;

        let mut items = Vec::with_capacity(request.items.len());
        let mut subtotal = Decimal::ZERO;
        for line in &request.items {
            let product = products
                .iter()
                .find(|p| p.id == line.product_id)
                .ok_or(StoreError::ProductNotFound(line.product_id))?;

            if !product.has_stock(line.quantity) {
                return Err(StoreError::InsufficientStock {
                    product_id: product.id,
                    name: product.name.clone(),
                    available: product.stock,
                }
                .into());
            }

            subtotal += product.price * Decimal::from(line.quantity);
            items.push(NewOrderItem {
                product_id: product.id,
                product_name: product.name.clone(),
                price: product.price,
                quantity: line.quantity,
            });
        }

        // Resolve the coupon against the server-side subtotal.
        let mut coupon_discount = None;
        if let Some(code) = &request.coupon_code {
            let coupon = self
                .store
                .coupon_by_code(code)
                .await?
                .ok_or(crate::services::coupons::CouponError::NotFound)?;
            check_usable(&coupon, subtotal, Utc::now()).map_err(OrderError::Coupon)?;
            coupon_discount = Some(compute_discount(&coupon, subtotal));
        }

        let discount = coupon_discount.unwrap_or(Decimal::ZERO);
        let total = (subtotal - discount).max(Decimal::ZERO).round_dp(2);

        let new_order = NewOrder {
            order_number: OrderNumber::generate(Utc::now()),
            user_id: user.id,
            customer_name: user.name.clone(),
            customer_email: user.email.clone(),
            total,
            shipping_address: request.shipping_address.trim().to_owned(),
            payment_method: request.payment_method.trim().to_owned(),
            coupon_code: request.coupon_code.clone().map(|c| c.to_uppercase()),
            coupon_discount,
        };

        let created = self.store.create_order(new_order, &items).await?;

        if let Some(code) = &request.coupon_code
            && !self.store.increment_coupon_usage(code).await?
        {
            // The order already carries the discount; the bounded increment
            // kept the usage invariant, so this is only worth a warning.
            warn!(
                coupon = %code,
                order_number = %created.order.order_number,
                "coupon usage could not be recorded"
            );
        }

        info!(
            order_number = %created.order.order_number,
            user_id = %user.id,
            total = %created.order.total,
            "order created"
        );

        self.notifier
            .order_created(&created.order, &created.items)
            .await;

        Ok(created)
    }

    /// Transition an order to a new status.
    ///
    /// The raw status string is validated against the six defined values,
    /// and the lifecycle rule (no backward moves, cancel only before
    /// delivery) is enforced by the store.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::InvalidStatus` for unknown values and
    /// `OrderError::Store` for missing orders or illegal transitions.
    pub async fn update_order_status(
        &self,
        order_id: OrderId,
        new_status: &str,
    ) -> Result<Order, OrderError> {
        let status = new_status
            .parse::<OrderStatus>()
            .map_err(|_| OrderError::InvalidStatus)?;

        let order = self.store.update_status(order_id, status).await?;

        info!(order_id = %order_id, status = %status, "order status updated");
        self.notifier.order_status_changed(&order).await;

        Ok(order)
    }

    /// Apply an asynchronous payment result from the gateway.
    ///
    /// Idempotent: re-applying the same result is a no-op, a conflicting
    /// result after settlement is logged and ignored, and an unknown
    /// correlation id acknowledges without doing anything (the caller is a
    /// webhook that should not retry).
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Store` only for storage failures.
    pub async fn record_payment_result(
        &self,
        correlation_id: &str,
        succeeded: bool,
        receipt_number: Option<String>,
    ) -> Result<PaymentAck, OrderError> {
        let result = PaymentResult {
            succeeded,
            receipt_number,
        };

        match self.store.apply_payment_result(correlation_id, &result).await? {
            PaymentApplication::Applied(order) => {
                info!(
                    order_number = %order.order_number,
                    payment_status = %order.payment_status,
                    "payment result applied"
                );
                self.notifier.payment_settled(&order).await;
                Ok(PaymentAck::Applied(order))
            }
            PaymentApplication::AlreadySettled(order) => {
                let conflicting = matches!(
                    (succeeded, order.payment_status),
                    (true, PaymentStatus::Failed) | (false, PaymentStatus::Completed)
                );
                if conflicting {
                    warn!(
                        order_number = %order.order_number,
                        correlation_id = %correlation_id,
                        settled = %order.payment_status,
                        incoming_success = succeeded,
                        "conflicting payment result for settled order ignored"
                    );
                } else {
                    info!(
                        order_number = %order.order_number,
                        correlation_id = %correlation_id,
                        "duplicate payment result ignored"
                    );
                }
                Ok(PaymentAck::Ignored)
            }
            PaymentApplication::UnknownCorrelation => {
                info!(
                    correlation_id = %correlation_id,
                    "payment result for unknown correlation id acknowledged"
                );
                Ok(PaymentAck::Ignored)
            }
        }
    }

    /// Stamp a gateway correlation id onto an order when a payment starts.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Store` if the order is unknown.
    pub async fn begin_payment(
        &self,
        order_number: &str,
        correlation_id: &str,
        payment_method: &str,
    ) -> Result<Order, OrderError> {
        Ok(self
            .store
            .attach_checkout_request(order_number, correlation_id, payment_method)
            .await?)
    }

    /// Get an order header by its order number.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Store` on storage failure.
    pub async fn get_by_number(&self, order_number: &str) -> Result<Option<Order>, OrderError> {
        Ok(self.store.get_by_number(order_number).await?)
    }

    /// Get an order header by its gateway correlation id.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Store` on storage failure.
    pub async fn find_by_correlation(
        &self,
        correlation_id: &str,
    ) -> Result<Option<Order>, OrderError> {
        Ok(self.store.get_by_correlation(correlation_id).await?)
    }

    /// List all orders (admin surface).
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Store` on storage failure.
    pub async fn list_all(&self) -> Result<Vec<OrderWithItems>, OrderError> {
        Ok(self.store.list_all().await?)
    }

    /// List a user's own orders.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Store` on storage failure.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<OrderWithItems>, OrderError> {
        Ok(self.store.list_for_user(user_id).await?)
    }

    /// Fetch an order with its tracking timeline, enforcing ownership.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Store` if the order is unknown and
    /// `OrderError::AccessDenied` if `requester` neither owns the order nor
    /// has moderation rights.
    pub async fn tracking(
        &self,
        order_id: OrderId,
        requester: &User,
    ) -> Result<(OrderWithItems, Vec<TrackingStep>), OrderError> {
        let order = self
            .store
            .get(order_id)
            .await?
            .ok_or(StoreError::OrderNotFound)?;

        if order.order.user_id != requester.id && !requester.role.is_moderator() {
            return Err(OrderError::AccessDenied);
        }

        let timeline = build_timeline(order.order.status);
        Ok((order, timeline))
    }
}

/// Build the tracking timeline for an order's current status.
///
/// The five forward checkpoints are marked completed up to the current
/// status; a cancelled order keeps only "order placed" completed and gets a
/// final cancelled step.
#[must_use]
pub fn build_timeline(status: OrderStatus) -> Vec<TrackingStep> {
    const LABELS: [(&str, OrderStatus); 5] = [
        ("Order Placed", OrderStatus::Pending),
        ("Confirmed", OrderStatus::Confirmed),
        ("Processing", OrderStatus::Processing),
        ("Shipped", OrderStatus::Shipped),
        ("Delivered", OrderStatus::Delivered),
    ];

    let current = status.sequence_index();
    let mut steps: Vec<TrackingStep> = LABELS
        .iter()
        .map(|&(label, step_status)| {
            let step_index = step_status.sequence_index().unwrap_or(0);
            TrackingStep {
                status: step_status,
                label,
                completed: current.is_some_and(|c| step_index <= c),
                active: status == step_status,
            }
        })
        .collect();

    if status == OrderStatus::Cancelled {
        // Only "order placed" remains meaningful on a cancelled order.
        if let Some(first) = steps.first_mut() {
            first.completed = true;
        }
        steps.push(TrackingStep {
            status: OrderStatus::Cancelled,
            label: "Cancelled",
            completed: true,
            active: true,
        });
    }

    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;

    use ecoshop_core::{CouponId, DiscountType, Email, UserRole};

    use crate::models::coupon::Coupon;
    use crate::models::order::OrderItem;
    use crate::models::product::Product;
    use crate::store::memory::MemoryOrderStore;

    /// Notifier double that records which hooks fired.
    #[derive(Default)]
    struct RecordingNotifier {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        fn calls(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clone()
        }

        fn record(&self, call: impl Into<String>) {
            self.calls
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(call.into());
        }
    }

    #[async_trait]
    impl OrderNotifier for RecordingNotifier {
        async fn order_created(&self, order: &Order, _items: &[OrderItem]) {
            self.record(format!("created:{}", order.order_number));
        }

        async fn order_status_changed(&self, order: &Order) {
            self.record(format!("status:{}", order.status));
        }

        async fn payment_settled(&self, order: &Order) {
            self.record(format!("payment:{}", order.payment_status));
        }
    }

    fn product(id: i32, name: &str, price: i64, stock: i32) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            description: format!("{name} description"),
            price: Decimal::from(price),
            category: "eco".to_owned(),
            stock,
            image: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn user(id: i32, role: UserRole) -> User {
        let now = Utc::now();
        User {
            id: UserId::new(id),
            name: "Jane Doe".to_owned(),
            email: Email::parse("jane@example.com").expect("valid email"),
            role,
            created_at: now,
            updated_at: now,
        }
    }

    fn service(store: &MemoryOrderStore) -> (OrderService<MemoryOrderStore>, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        (
            OrderService::new(store.clone(), notifier.clone()),
            notifier,
        )
    }

    fn two_item_request() -> CreateOrder {
        CreateOrder {
            items: vec![
                OrderLine {
                    product_id: ProductId::new(1),
                    quantity: 2,
                },
                OrderLine {
                    product_id: ProductId::new(2),
                    quantity: 1,
                },
            ],
            shipping_address: "12 Moss Lane, Nairobi".to_owned(),
            payment_method: "mpesa".to_owned(),
            coupon_code: None,
        }
    }

    #[tokio::test]
    async fn test_create_order_decrements_stock_and_starts_pending() {
        let store = MemoryOrderStore::new();
        store.insert_product(product(1, "Bamboo Toothbrush", 5, 5));
        store.insert_product(product(2, "Solar Lantern", 40, 1));
        let (service, notifier) = service(&store);

        let created = service
            .create_order(&user(7, UserRole::User), two_item_request())
            .await
            .expect("order created");

        assert_eq!(store.stock_of(ProductId::new(1)), Some(3));
        assert_eq!(store.stock_of(ProductId::new(2)), Some(0));
        assert_eq!(created.order.status, OrderStatus::Pending);
        assert_eq!(created.order.payment_status, PaymentStatus::Pending);
        assert_eq!(created.order.total, Decimal::from(50));
        assert_eq!(created.items.len(), 2);
        assert_eq!(created.items[0].product_name, "Bamboo Toothbrush");
        assert!(notifier.calls()[0].starts_with("created:ORD-"));
    }

    #[tokio::test]
    async fn test_create_order_insufficient_stock_creates_nothing() {
        let store = MemoryOrderStore::new();
        store.insert_product(product(1, "Bamboo Toothbrush", 5, 5));
        store.insert_product(product(2, "Solar Lantern", 40, 1));
        let (service, notifier) = service(&store);

        let mut request = two_item_request();
        request.items[1].quantity = 2; // only 1 lantern in stock

        let err = service
            .create_order(&user(7, UserRole::User), request)
            .await
            .expect_err("must fail");

        match err {
            OrderError::Store(StoreError::InsufficientStock {
                name, available, ..
            }) => {
                assert_eq!(name, "Solar Lantern");
                assert_eq!(available, 1);
            }
            other => panic!("unexpected error: {other}"),
        }

        // No partial state: both stocks untouched, no order, no side effects.
        assert_eq!(store.stock_of(ProductId::new(1)), Some(5));
        assert_eq!(store.stock_of(ProductId::new(2)), Some(1));
        assert_eq!(store.order_count(), 0);
        assert!(notifier.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_order_unknown_product() {
        let store = MemoryOrderStore::new();
        let (service, _) = service(&store);

        let err = service
            .create_order(&user(7, UserRole::User), two_item_request())
            .await
            .expect_err("must fail");

        assert!(matches!(
            err,
            OrderError::Store(StoreError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_order_rejects_bad_input() {
        let store = MemoryOrderStore::new();
        store.insert_product(product(1, "Bamboo Toothbrush", 5, 5));
        let (service, _) = service(&store);
        let customer = user(7, UserRole::User);

        let empty = CreateOrder {
            items: vec![],
            shipping_address: "a".to_owned(),
            payment_method: "card".to_owned(),
            coupon_code: None,
        };
        assert!(matches!(
            service.create_order(&customer, empty).await,
            Err(OrderError::Validation(_))
        ));

        let mut zero_quantity = two_item_request();
        zero_quantity.items[0].quantity = 0;
        assert!(matches!(
            service.create_order(&customer, zero_quantity).await,
            Err(OrderError::Validation(_))
        ));

        let mut blank_address = two_item_request();
        blank_address.shipping_address = "  ".to_owned();
        assert!(matches!(
            service.create_order(&customer, blank_address).await,
            Err(OrderError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_create_order_applies_coupon() {
        let store = MemoryOrderStore::new();
        store.insert_product(product(1, "Bamboo Toothbrush", 5, 5));
        store.insert_product(product(2, "Solar Lantern", 40, 1));
        let now = Utc::now();
        store.insert_coupon(Coupon {
            id: CouponId::new(1),
            code: "ECO20".to_owned(),
            description: None,
            discount_type: DiscountType::Percentage,
            discount_value: Decimal::from(20),
            min_purchase: Decimal::ZERO,
            max_discount: None,
            usage_limit: Some(10),
            used_count: 0,
            expiry_date: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        });
        let (service, _) = service(&store);

        let mut request = two_item_request();
        request.coupon_code = Some("eco20".to_owned());

        let created = service
            .create_order(&user(7, UserRole::User), request)
            .await
            .expect("order created");

        // Subtotal 50, 20% off.
        assert_eq!(created.order.total, Decimal::from(40));
        assert_eq!(created.order.coupon_code.as_deref(), Some("ECO20"));
        assert_eq!(created.order.coupon_discount, Some(Decimal::from(10)));
        assert_eq!(store.coupon_used_count("ECO20"), Some(1));
    }

    #[tokio::test]
    async fn test_create_order_rejects_exhausted_coupon() {
        let store = MemoryOrderStore::new();
        store.insert_product(product(1, "Bamboo Toothbrush", 5, 5));
        let now = Utc::now();
        store.insert_coupon(Coupon {
            id: CouponId::new(1),
            code: "GONE".to_owned(),
            description: None,
            discount_type: DiscountType::Fixed,
            discount_value: Decimal::from(5),
            min_purchase: Decimal::ZERO,
            max_discount: None,
            usage_limit: Some(1),
            used_count: 1,
            expiry_date: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        });
        let (service, _) = service(&store);

        let request = CreateOrder {
            items: vec![OrderLine {
                product_id: ProductId::new(1),
                quantity: 1,
            }],
            shipping_address: "12 Moss Lane".to_owned(),
            payment_method: "card".to_owned(),
            coupon_code: Some("GONE".to_owned()),
        };

        let err = service
            .create_order(&user(7, UserRole::User), request)
            .await
            .expect_err("must fail");
        assert!(matches!(err, OrderError::Coupon(_)));
        assert_eq!(store.order_count(), 0);
        assert_eq!(store.stock_of(ProductId::new(1)), Some(5));
    }

    #[tokio::test]
    async fn test_update_status_rejects_unknown_value() {
        let store = MemoryOrderStore::new();
        store.insert_product(product(1, "Bamboo Toothbrush", 5, 5));
        let (service, notifier) = service(&store);

        let created = service
            .create_order(&user(7, UserRole::User), two_item_request_single())
            .await
            .expect("order created");

        let err = service
            .update_order_status(created.order.id, "bogus")
            .await
            .expect_err("must fail");
        assert!(matches!(err, OrderError::InvalidStatus));

        // Status unchanged, no status notification fired.
        let unchanged = store.order(created.order.id).expect("order");
        assert_eq!(unchanged.status, OrderStatus::Pending);
        assert!(!notifier.calls().iter().any(|c| c.starts_with("status:")));
    }

    fn two_item_request_single() -> CreateOrder {
        CreateOrder {
            items: vec![OrderLine {
                product_id: ProductId::new(1),
                quantity: 1,
            }],
            shipping_address: "12 Moss Lane".to_owned(),
            payment_method: "card".to_owned(),
            coupon_code: None,
        }
    }

    #[tokio::test]
    async fn test_update_status_walks_lifecycle_and_notifies() {
        let store = MemoryOrderStore::new();
        store.insert_product(product(1, "Bamboo Toothbrush", 5, 5));
        let (service, notifier) = service(&store);

        let created = service
            .create_order(&user(7, UserRole::User), two_item_request_single())
            .await
            .expect("order created");

        let order = service
            .update_order_status(created.order.id, "shipped")
            .await
            .expect("shipped");
        assert_eq!(order.status, OrderStatus::Shipped);
        assert!(notifier.calls().contains(&"status:shipped".to_owned()));

        // Backward move is a conflict and leaves the status alone.
        let err = service
            .update_order_status(created.order.id, "confirmed")
            .await
            .expect_err("must fail");
        assert!(matches!(
            err,
            OrderError::Store(StoreError::InvalidTransition { .. })
        ));
        let unchanged = store.order(created.order.id).expect("order");
        assert_eq!(unchanged.status, OrderStatus::Shipped);
    }

    #[tokio::test]
    async fn test_payment_success_confirms_order() {
        let store = MemoryOrderStore::new();
        store.insert_product(product(1, "Bamboo Toothbrush", 5, 5));
        let (service, notifier) = service(&store);

        let created = service
            .create_order(&user(7, UserRole::User), two_item_request_single())
            .await
            .expect("order created");
        service
            .begin_payment(created.order.order_number.as_str(), "ws_CO_test1", "mpesa")
            .await
            .expect("payment started");

        let ack = service
            .record_payment_result("ws_CO_test1", true, Some("R1".to_owned()))
            .await
            .expect("applied");
        assert!(matches!(ack, PaymentAck::Applied(_)));

        let order = store.order(created.order.id).expect("order");
        assert_eq!(order.payment_status, PaymentStatus::Completed);
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.receipt_number.as_deref(), Some("R1"));
        assert!(order.paid_at.is_some());
        assert!(notifier.calls().contains(&"payment:completed".to_owned()));
    }

    #[tokio::test]
    async fn test_payment_failure_cancels_order() {
        let store = MemoryOrderStore::new();
        store.insert_product(product(1, "Bamboo Toothbrush", 5, 5));
        let (service, _) = service(&store);

        let created = service
            .create_order(&user(7, UserRole::User), two_item_request_single())
            .await
            .expect("order created");
        service
            .begin_payment(created.order.order_number.as_str(), "ws_CO_test2", "mpesa")
            .await
            .expect("payment started");

        service
            .record_payment_result("ws_CO_test2", false, None)
            .await
            .expect("applied");

        let order = store.order(created.order.id).expect("order");
        assert_eq!(order.payment_status, PaymentStatus::Failed);
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert!(order.paid_at.is_none());
    }

    #[tokio::test]
    async fn test_payment_result_is_idempotent() {
        let store = MemoryOrderStore::new();
        store.insert_product(product(1, "Bamboo Toothbrush", 5, 5));
        let (service, _) = service(&store);

        let created = service
            .create_order(&user(7, UserRole::User), two_item_request_single())
            .await
            .expect("order created");
        service
            .begin_payment(created.order.order_number.as_str(), "ws_CO_test3", "mpesa")
            .await
            .expect("payment started");

        service
            .record_payment_result("ws_CO_test3", true, Some("R1".to_owned()))
            .await
            .expect("applied");
        let after_first = store.order(created.order.id).expect("order");

        // Same result again: no-op.
        let ack = service
            .record_payment_result("ws_CO_test3", true, Some("R1".to_owned()))
            .await
            .expect("acknowledged");
        assert!(matches!(ack, PaymentAck::Ignored));

        // Conflicting result after completion: logged no-op, nothing reverts.
        let ack = service
            .record_payment_result("ws_CO_test3", false, None)
            .await
            .expect("acknowledged");
        assert!(matches!(ack, PaymentAck::Ignored));

        let after_all = store.order(created.order.id).expect("order");
        assert_eq!(after_all.payment_status, after_first.payment_status);
        assert_eq!(after_all.status, after_first.status);
        assert_eq!(after_all.receipt_number, after_first.receipt_number);
    }

    #[tokio::test]
    async fn test_payment_result_unknown_correlation_is_acknowledged() {
        let store = MemoryOrderStore::new();
        let (service, notifier) = service(&store);

        let ack = service
            .record_payment_result("ws_CO_missing", true, None)
            .await
            .expect("acknowledged");
        assert!(matches!(ack, PaymentAck::Ignored));
        assert!(notifier.calls().is_empty());
    }

    #[tokio::test]
    async fn test_tracking_enforces_ownership() {
        let store = MemoryOrderStore::new();
        store.insert_product(product(1, "Bamboo Toothbrush", 5, 5));
        let (service, _) = service(&store);
        let owner = user(7, UserRole::User);

        let created = service
            .create_order(&owner, two_item_request_single())
            .await
            .expect("order created");

        // Owner and admin can see it; another user cannot.
        assert!(service.tracking(created.order.id, &owner).await.is_ok());
        assert!(
            service
                .tracking(created.order.id, &user(1, UserRole::Admin))
                .await
                .is_ok()
        );
        let err = service
            .tracking(created.order.id, &user(8, UserRole::User))
            .await
            .expect_err("must fail");
        assert!(matches!(err, OrderError::AccessDenied));
    }

    #[test]
    fn test_timeline_for_shipped_order() {
        let timeline = build_timeline(OrderStatus::Shipped);
        assert_eq!(timeline.len(), 5);
        assert!(timeline[0].completed && timeline[1].completed);
        assert!(timeline[2].completed && timeline[3].completed);
        assert!(!timeline[4].completed);
        assert!(timeline[3].active);
        assert!(!timeline[4].active);
    }

    #[test]
    fn test_timeline_for_cancelled_order() {
        let timeline = build_timeline(OrderStatus::Cancelled);
        assert_eq!(timeline.len(), 6);
        assert!(timeline[0].completed);
        assert!(!timeline[1].completed);
        let last = timeline.last().expect("cancelled step");
        assert_eq!(last.status, OrderStatus::Cancelled);
        assert!(last.active && last.completed);
    }
}
