//! Rating repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use ecoshop_core::{ProductId, RatingId, UserId};

use super::RepositoryError;
use crate::models::rating::{Rating, RatingSummary};

/// Internal row type for rating queries joined with the author's name.
#[derive(Debug, sqlx::FromRow)]
struct RatingRow {
    id: i32,
    user_id: i32,
    product_id: i32,
    rating: i32,
    review: Option<String>,
    user_name: String,
    created_at: DateTime<Utc>,
}

impl From<RatingRow> for Rating {
    fn from(row: RatingRow) -> Self {
        Self {
            id: RatingId::new(row.id),
            user_id: UserId::new(row.user_id),
            product_id: ProductId::new(row.product_id),
            rating: row.rating,
            review: row.review,
            user_name: row.user_name,
            created_at: row.created_at,
        }
    }
}

/// Internal row type for the rating aggregate.
#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    average_rating: f64,
    total_ratings: i64,
}

const RATING_SELECT: &str = "SELECT r.id, r.user_id, r.product_id, r.rating, r.review, \
            u.name AS user_name, r.created_at \
     FROM ratings r \
     JOIN users u ON u.id = r.user_id";

/// Repository for product rating database operations.
pub struct RatingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RatingRepository<'a> {
    /// Create a new rating repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a product's ratings, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Rating>, RepositoryError> {
        let rows = sqlx::query_as::<_, RatingRow>(&format!(
            "{RATING_SELECT} WHERE r.product_id = $1 ORDER BY r.created_at DESC"
        ))
        .bind(product_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Upsert a user's rating for a product (one rating per user/product).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn upsert(
        &self,
        user_id: UserId,
        product_id: ProductId,
        rating: i32,
        review: Option<&str>,
    ) -> Result<Rating, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO ratings (user_id, product_id, rating, review)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, product_id)
             DO UPDATE SET rating = EXCLUDED.rating, review = EXCLUDED.review, updated_at = now()
             RETURNING id",
        )
        .bind(user_id.as_i32())
        .bind(product_id.as_i32())
        .bind(rating)
        .bind(review)
        .fetch_one(self.pool)
        .await?;

        let row = sqlx::query_as::<_, RatingRow>(&format!("{RATING_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_one(self.pool)
            .await?;

        Ok(row.into())
    }

    /// Aggregate rating for a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn summary(&self, product_id: ProductId) -> Result<RatingSummary, RepositoryError> {
        let row = sqlx::query_as::<_, SummaryRow>(
            "SELECT COALESCE(AVG(rating), 0)::float8 AS average_rating,
                    COUNT(*) AS total_ratings
             FROM ratings WHERE product_id = $1",
        )
        .bind(product_id.as_i32())
        .fetch_one(self.pool)
        .await?;

        Ok(RatingSummary {
            average_rating: (row.average_rating * 10.0).round() / 10.0,
            total_ratings: row.total_ratings,
        })
    }
}
