//! `PostgreSQL` implementation of the order store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use ecoshop_core::{
    Email, OrderId, OrderItemId, OrderNumber, OrderStatus, PaymentStatus, ProductId, UserId,
};

use super::{NewOrder, NewOrderItem, OrderStore, PaymentApplication, PaymentResult, StoreError};
use crate::db::{CouponRepository, RepositoryError};
use crate::models::coupon::Coupon;
use crate::models::order::{Order, OrderItem, OrderWithItems};
use crate::models::product::Product;

fn repo_error(err: RepositoryError) -> StoreError {
    match err {
        RepositoryError::Database(e) => StoreError::Database(e),
        RepositoryError::DataCorruption(msg) => StoreError::DataCorruption(msg),
        other => StoreError::DataCorruption(other.to_string()),
    }
}

/// Internal row type for order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    order_number: String,
    user_id: i32,
    customer_name: String,
    customer_email: String,
    total: Decimal,
    status: String,
    payment_status: String,
    shipping_address: String,
    payment_method: String,
    coupon_code: Option<String>,
    coupon_discount: Option<Decimal>,
    checkout_request_id: Option<String>,
    receipt_number: Option<String>,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let customer_email = Email::parse(&row.customer_email)
            .map_err(|e| StoreError::DataCorruption(format!("invalid email in database: {e}")))?;
        let status = row
            .status
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::DataCorruption(format!("invalid status in database: {e}")))?;
        let payment_status = row.payment_status.parse::<PaymentStatus>().map_err(|e| {
            StoreError::DataCorruption(format!("invalid payment status in database: {e}"))
        })?;

        Ok(Self {
            id: OrderId::new(row.id),
            order_number: OrderNumber::from_string(row.order_number),
            user_id: UserId::new(row.user_id),
            customer_name: row.customer_name,
            customer_email,
            total: row.total,
            status,
            payment_status,
            shipping_address: row.shipping_address,
            payment_method: row.payment_method,
            coupon_code: row.coupon_code,
            coupon_discount: row.coupon_discount,
            checkout_request_id: row.checkout_request_id,
            receipt_number: row.receipt_number,
            paid_at: row.paid_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Internal row type for order item queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    product_name: String,
    price: Decimal,
    quantity: i32,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            price: row.price,
            quantity: row.quantity,
        }
    }
}

/// Internal row type for product lookups during order creation.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: String,
    price: Decimal,
    category: String,
    stock: i32,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            category: row.category,
            stock: row.stock,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const ORDER_COLUMNS: &str = "id, order_number, user_id, customer_name, customer_email, total, \
     status, payment_status, shipping_address, payment_method, coupon_code, coupon_discount, \
     checkout_request_id, receipt_number, paid_at, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, product_name, price, quantity";

/// `PostgreSQL`-backed order store.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Create a new store over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn items_for(&self, order_id: i32) -> Result<Vec<OrderItem>, StoreError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn with_items(&self, rows: Vec<OrderRow>) -> Result<Vec<OrderWithItems>, StoreError> {
        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.items_for(row.id).await?;
            result.push(OrderWithItems {
                order: row.try_into()?,
                items,
            });
        }
        Ok(result)
    }

    /// Decrement a product's stock inside the order transaction.
    ///
    /// The `stock >= quantity` predicate re-validates availability at write
    /// time; zero affected rows means another order won the race (or the
    /// product vanished), and the whole transaction is abandoned.
    async fn decrement_stock(
        tx: &mut Transaction<'_, Postgres>,
        item: &NewOrderItem,
    ) -> Result<(), StoreError> {
        let affected = sqlx::query(
            "UPDATE products
             SET stock = stock - $1, updated_at = now()
             WHERE id = $2 AND stock >= $1",
        )
        .bind(item.quantity)
        .bind(item.product_id.as_i32())
        .execute(&mut **tx)
        .await?
        .rows_affected();

        if affected == 1 {
            return Ok(());
        }

        // Distinguish "not enough stock" from "no such product" for the error.
        let current: Option<(String, i32)> =
            sqlx::query_as("SELECT name, stock FROM products WHERE id = $1")
                .bind(item.product_id.as_i32())
                .fetch_optional(&mut **tx)
                .await?;

        match current {
            Some((name, available)) => Err(StoreError::InsufficientStock {
                product_id: item.product_id,
                name,
                available,
            }),
            None => Err(StoreError::ProductNotFound(item.product_id)),
        }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, StoreError> {
        let raw_ids: Vec<i32> = ids.iter().map(|id| id.as_i32()).collect();
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, description, price, category, stock, image, created_at, updated_at
             FROM products WHERE id = ANY($1)",
        )
        .bind(&raw_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_order(
        &self,
        order: NewOrder,
        items: &[NewOrderItem],
    ) -> Result<OrderWithItems, StoreError> {
        let mut tx = self.pool.begin().await?;

        let order_row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders (order_number, user_id, customer_name, customer_email, total,
                                 shipping_address, payment_method, coupon_code, coupon_discount)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order.order_number.as_str())
        .bind(order.user_id.as_i32())
        .bind(&order.customer_name)
        .bind(order.customer_email.as_str())
        .bind(order.total)
        .bind(&order.shipping_address)
        .bind(&order.payment_method)
        .bind(&order.coupon_code)
        .bind(order.coupon_discount)
        .fetch_one(&mut *tx)
        .await?;

        let mut stored_items = Vec::with_capacity(items.len());
        for item in items {
            Self::decrement_stock(&mut tx, item).await?;

            let item_row = sqlx::query_as::<_, OrderItemRow>(&format!(
                "INSERT INTO order_items (order_id, product_id, product_name, price, quantity)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING {ITEM_COLUMNS}"
            ))
            .bind(order_row.id)
            .bind(item.product_id.as_i32())
            .bind(&item.product_name)
            .bind(item.price)
            .bind(item.quantity)
            .fetch_one(&mut *tx)
            .await?;

            stored_items.push(item_row.into());
        }

        tx.commit().await?;

        Ok(OrderWithItems {
            order: order_row.try_into()?,
            items: stored_items,
        })
    }

    async fn get(&self, id: OrderId) -> Result<Option<OrderWithItems>, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let items = self.items_for(row.id).await?;
                Ok(Some(OrderWithItems {
                    order: row.try_into()?,
                    items,
                }))
            }
            None => Ok(None),
        }
    }

    async fn get_by_number(&self, order_number: &str) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = $1"
        ))
        .bind(order_number)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_by_correlation(&self, correlation_id: &str) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE checkout_request_id = $1"
        ))
        .bind(correlation_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_all(&self) -> Result<Vec<OrderWithItems>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        self.with_items(rows).await
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<OrderWithItems>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id.as_i32())
        .fetch_all(&self.pool)
        .await?;

        self.with_items(rows).await
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Lock the row so the transition check and the write are one unit.
        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
                .bind(id.as_i32())
                .fetch_optional(&mut *tx)
                .await?;

        let current = current
            .ok_or(StoreError::OrderNotFound)?
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::DataCorruption(format!("invalid status in database: {e}")))?;

        if !current.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                from: current,
                to: status,
            });
        }

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders SET status = $1, updated_at = now()
             WHERE id = $2
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(status.to_string())
        .bind(id.as_i32())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        row.try_into()
    }

    async fn attach_checkout_request(
        &self,
        order_number: &str,
        correlation_id: &str,
        payment_method: &str,
    ) -> Result<Order, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders
             SET checkout_request_id = $1, payment_method = $2, updated_at = now()
             WHERE order_number = $3
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(correlation_id)
        .bind(payment_method)
        .bind(order_number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::OrderNotFound)?;

        row.try_into()
    }

    async fn apply_payment_result(
        &self,
        correlation_id: &str,
        result: &PaymentResult,
    ) -> Result<PaymentApplication, StoreError> {
        let (payment_status, status) = if result.succeeded {
            (PaymentStatus::Completed, OrderStatus::Confirmed)
        } else {
            (PaymentStatus::Failed, OrderStatus::Cancelled)
        };

        // Single conditional update: only a pending payment is ever settled,
        // which makes redundant and conflicting callbacks no-ops.
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders
             SET payment_status = $1,
                 status = $2,
                 receipt_number = COALESCE($3, receipt_number),
                 paid_at = CASE WHEN $4 THEN now() ELSE paid_at END,
                 updated_at = now()
             WHERE checkout_request_id = $5 AND payment_status = 'pending'
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(payment_status.to_string())
        .bind(status.to_string())
        .bind(&result.receipt_number)
        .bind(result.succeeded)
        .bind(correlation_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(PaymentApplication::Applied(Box::new(row.try_into()?)));
        }

        let existing = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE checkout_request_id = $1"
        ))
        .bind(correlation_id)
        .fetch_optional(&self.pool)
        .await?;

        match existing {
            Some(row) => Ok(PaymentApplication::AlreadySettled(Box::new(row.try_into()?))),
            None => Ok(PaymentApplication::UnknownCorrelation),
        }
    }

    async fn coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, StoreError> {
        CouponRepository::new(&self.pool)
            .get_by_code(code)
            .await
            .map_err(repo_error)
    }

    async fn increment_coupon_usage(&self, code: &str) -> Result<bool, StoreError> {
        match CouponRepository::new(&self.pool).increment_usage(code).await {
            Ok(_) => Ok(true),
            Err(RepositoryError::NotFound | RepositoryError::Conflict(_)) => Ok(false),
            Err(other) => Err(repo_error(other)),
        }
    }
}
