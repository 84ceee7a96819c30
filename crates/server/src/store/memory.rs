//! In-memory order store used by service-level tests.
//!
//! Mirrors the transactional semantics of the Postgres store: order creation
//! either fully applies (order + items + stock decrements) or leaves nothing
//! behind, and payment results only settle a pending payment.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use ecoshop_core::{
    OrderId, OrderItemId, OrderStatus, PaymentStatus, ProductId, UserId,
};

use super::{NewOrder, NewOrderItem, OrderStore, PaymentApplication, PaymentResult, StoreError};
use crate::models::coupon::Coupon;
use crate::models::order::{Order, OrderItem, OrderWithItems};
use crate::models::product::Product;

#[derive(Default)]
struct Inner {
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
    items: HashMap<OrderId, Vec<OrderItem>>,
    coupons: HashMap<String, Coupon>,
    next_order_id: i32,
    next_item_id: i32,
}

/// In-memory [`OrderStore`] double.
#[derive(Clone, Default)]
pub struct MemoryOrderStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryOrderStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Seed a product.
    pub fn insert_product(&self, product: Product) {
        self.lock().products.insert(product.id, product);
    }

    /// Seed a coupon (keyed by its uppercase code).
    pub fn insert_coupon(&self, coupon: Coupon) {
        self.lock().coupons.insert(coupon.code.to_uppercase(), coupon);
    }

    /// Read back a coupon's usage count.
    #[must_use]
    pub fn coupon_used_count(&self, code: &str) -> Option<i32> {
        self.lock()
            .coupons
            .get(&code.to_uppercase())
            .map(|c| c.used_count)
    }

    /// Read back a product's current stock.
    #[must_use]
    pub fn stock_of(&self, id: ProductId) -> Option<i32> {
        self.lock().products.get(&id).map(|p| p.stock)
    }

    /// Number of stored orders.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.lock().orders.len()
    }

    /// Fetch a stored order by id.
    #[must_use]
    pub fn order(&self, id: OrderId) -> Option<Order> {
        self.lock().orders.get(&id).cloned()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, StoreError> {
        let inner = self.lock();
        Ok(ids
            .iter()
            .filter_map(|id| inner.products.get(id).cloned())
            .collect())
    }

    async fn create_order(
        &self,
        order: NewOrder,
        items: &[NewOrderItem],
    ) -> Result<OrderWithItems, StoreError> {
        let mut inner = self.lock();

        // Re-validate every decrement before mutating anything, so a failing
        // item leaves no partial state (the "transaction").
        for item in items {
            match inner.products.get(&item.product_id) {
                None => return Err(StoreError::ProductNotFound(item.product_id)),
                Some(product) if product.stock < item.quantity => {
                    return Err(StoreError::InsufficientStock {
                        product_id: item.product_id,
                        name: product.name.clone(),
                        available: product.stock,
                    });
                }
                Some(_) => {}
            }
        }

        for item in items {
            if let Some(product) = inner.products.get_mut(&item.product_id) {
                product.stock -= item.quantity;
            }
        }

        inner.next_order_id += 1;
        let order_id = OrderId::new(inner.next_order_id);
        let now = Utc::now();

        let stored = Order {
            id: order_id,
            order_number: order.order_number,
            user_id: order.user_id,
            customer_name: order.customer_name,
            customer_email: order.customer_email,
            total: order.total,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            shipping_address: order.shipping_address,
            payment_method: order.payment_method,
            coupon_code: order.coupon_code,
            coupon_discount: order.coupon_discount,
            checkout_request_id: None,
            receipt_number: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        };

        let stored_items: Vec<OrderItem> = items
            .iter()
            .map(|item| {
                inner.next_item_id += 1;
                OrderItem {
                    id: OrderItemId::new(inner.next_item_id),
                    order_id,
                    product_id: item.product_id,
                    product_name: item.product_name.clone(),
                    price: item.price,
                    quantity: item.quantity,
                }
            })
            .collect();

        inner.orders.insert(order_id, stored.clone());
        inner.items.insert(order_id, stored_items.clone());

        Ok(OrderWithItems {
            order: stored,
            items: stored_items,
        })
    }

    async fn get(&self, id: OrderId) -> Result<Option<OrderWithItems>, StoreError> {
        let inner = self.lock();
        Ok(inner.orders.get(&id).map(|order| OrderWithItems {
            order: order.clone(),
            items: inner.items.get(&id).cloned().unwrap_or_default(),
        }))
    }

    async fn get_by_number(&self, order_number: &str) -> Result<Option<Order>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .orders
            .values()
            .find(|o| o.order_number.as_str() == order_number)
            .cloned())
    }

    async fn get_by_correlation(&self, correlation_id: &str) -> Result<Option<Order>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .orders
            .values()
            .find(|o| o.checkout_request_id.as_deref() == Some(correlation_id))
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<OrderWithItems>, StoreError> {
        let inner = self.lock();
        let mut orders: Vec<OrderWithItems> = inner
            .orders
            .values()
            .map(|order| OrderWithItems {
                order: order.clone(),
                items: inner.items.get(&order.id).cloned().unwrap_or_default(),
            })
            .collect();
        orders.sort_by(|a, b| b.order.created_at.cmp(&a.order.created_at));
        Ok(orders)
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<OrderWithItems>, StoreError> {
        let mut orders = self.list_all().await?;
        orders.retain(|o| o.order.user_id == user_id);
        Ok(orders)
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, StoreError> {
        let mut inner = self.lock();
        let order = inner.orders.get_mut(&id).ok_or(StoreError::OrderNotFound)?;

        if !order.status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                from: order.status,
                to: status,
            });
        }

        order.status = status;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn attach_checkout_request(
        &self,
        order_number: &str,
        correlation_id: &str,
        payment_method: &str,
    ) -> Result<Order, StoreError> {
        let mut inner = self.lock();
        let order = inner
            .orders
            .values_mut()
            .find(|o| o.order_number.as_str() == order_number)
            .ok_or(StoreError::OrderNotFound)?;

        order.checkout_request_id = Some(correlation_id.to_owned());
        order.payment_method = payment_method.to_owned();
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn apply_payment_result(
        &self,
        correlation_id: &str,
        result: &PaymentResult,
    ) -> Result<PaymentApplication, StoreError> {
        let mut inner = self.lock();
        let Some(order) = inner
            .orders
            .values_mut()
            .find(|o| o.checkout_request_id.as_deref() == Some(correlation_id))
        else {
            return Ok(PaymentApplication::UnknownCorrelation);
        };

        if order.payment_status.is_settled() {
            return Ok(PaymentApplication::AlreadySettled(Box::new(order.clone())));
        }

        if result.succeeded {
            order.payment_status = PaymentStatus::Completed;
            order.status = OrderStatus::Confirmed;
            order.receipt_number = result.receipt_number.clone();
            order.paid_at = Some(Utc::now());
        } else {
            order.payment_status = PaymentStatus::Failed;
            order.status = OrderStatus::Cancelled;
        }
        order.updated_at = Utc::now();

        Ok(PaymentApplication::Applied(Box::new(order.clone())))
    }

    async fn coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, StoreError> {
        Ok(self.lock().coupons.get(&code.to_uppercase()).cloned())
    }

    async fn increment_coupon_usage(&self, code: &str) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let Some(coupon) = inner.coupons.get_mut(&code.to_uppercase()) else {
            return Ok(false);
        };
        if coupon.usage_limit.is_some_and(|limit| coupon.used_count >= limit) {
            return Ok(false);
        }
        coupon.used_count += 1;
        Ok(true)
    }
}
