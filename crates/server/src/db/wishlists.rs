//! Wishlist repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use ecoshop_core::{ProductId, UserId, WishlistItemId};

use super::RepositoryError;
use crate::models::product::Product;
use crate::models::wishlist::WishlistItem;

/// Internal row type for wishlist queries joined with products.
#[derive(Debug, sqlx::FromRow)]
struct WishlistItemRow {
    id: i32,
    user_id: i32,
    product_id: i32,
    created_at: DateTime<Utc>,
    name: String,
    description: String,
    price: Decimal,
    category: String,
    stock: i32,
    image: Option<String>,
    product_created_at: DateTime<Utc>,
    product_updated_at: DateTime<Utc>,
}

impl From<WishlistItemRow> for WishlistItem {
    fn from(row: WishlistItemRow) -> Self {
        Self {
            id: WishlistItemId::new(row.id),
            user_id: UserId::new(row.user_id),
            product_id: ProductId::new(row.product_id),
            product: Product {
                id: ProductId::new(row.product_id),
                name: row.name,
                description: row.description,
                price: row.price,
                category: row.category,
                stock: row.stock,
                image: row.image,
                created_at: row.product_created_at,
                updated_at: row.product_updated_at,
            },
            created_at: row.created_at,
        }
    }
}

const WISHLIST_SELECT: &str = "SELECT w.id, w.user_id, w.product_id, w.created_at, \
            p.name, p.description, p.price, p.category, p.stock, p.image, \
            p.created_at AS product_created_at, p.updated_at AS product_updated_at \
     FROM wishlist_items w \
     JOIN products p ON p.id = w.product_id";

/// Repository for wishlist database operations.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's wishlist, newest first, with product details.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<WishlistItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, WishlistItemRow>(&format!(
            "{WISHLIST_SELECT} WHERE w.user_id = $1 ORDER BY w.created_at DESC"
        ))
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Add a product to a user's wishlist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the product is already listed.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<WishlistItem, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO wishlist_items (user_id, product_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(user_id.as_i32())
        .bind(product_id.as_i32())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "product already in wishlist"))?;

        let row = sqlx::query_as::<_, WishlistItemRow>(&format!("{WISHLIST_SELECT} WHERE w.id = $1"))
            .bind(id)
            .fetch_one(self.pool)
            .await?;

        Ok(row.into())
    }

    /// Remove a product from a user's wishlist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product isn't listed.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn remove(&self, user_id: UserId, product_id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1 AND product_id = $2")
            .bind(user_id.as_i32())
            .bind(product_id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Clear a user's wishlist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1")
            .bind(user_id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
