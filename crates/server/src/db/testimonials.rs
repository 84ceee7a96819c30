//! Testimonial repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use ecoshop_core::{TestimonialId, TestimonialStatus, UserId};

use super::RepositoryError;
use crate::models::testimonial::Testimonial;

/// Internal row type for testimonial queries.
#[derive(Debug, sqlx::FromRow)]
struct TestimonialRow {
    id: i32,
    user_id: i32,
    name: String,
    role: String,
    comment: String,
    rating: i32,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<TestimonialRow> for Testimonial {
    type Error = RepositoryError;

    fn try_from(row: TestimonialRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<TestimonialStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid testimonial status in database: {e}"))
        })?;

        Ok(Self {
            id: TestimonialId::new(row.id),
            user_id: UserId::new(row.user_id),
            name: row.name,
            role: row.role,
            comment: row.comment,
            rating: row.rating,
            status,
            created_at: row.created_at,
        })
    }
}

const TESTIMONIAL_COLUMNS: &str = "id, user_id, name, role, comment, rating, status, created_at";

/// Repository for testimonial database operations.
pub struct TestimonialRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TestimonialRepository<'a> {
    /// Create a new testimonial repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Submit a testimonial. It starts in `pending` status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        name: &str,
        role: &str,
        comment: &str,
        rating: i32,
    ) -> Result<Testimonial, RepositoryError> {
        let row = sqlx::query_as::<_, TestimonialRow>(&format!(
            "INSERT INTO testimonials (user_id, name, role, comment, rating)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {TESTIMONIAL_COLUMNS}"
        ))
        .bind(user_id.as_i32())
        .bind(name)
        .bind(role)
        .bind(comment)
        .bind(rating)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// List approved testimonials, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_approved(&self, limit: i64) -> Result<Vec<Testimonial>, RepositoryError> {
        let rows = sqlx::query_as::<_, TestimonialRow>(&format!(
            "SELECT {TESTIMONIAL_COLUMNS} FROM testimonials
             WHERE status = 'approved'
             ORDER BY created_at DESC
             LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// List every testimonial regardless of status (moderation view).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Testimonial>, RepositoryError> {
        let rows = sqlx::query_as::<_, TestimonialRow>(&format!(
            "SELECT {TESTIMONIAL_COLUMNS} FROM testimonials ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Set a testimonial's moderation status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the testimonial doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_status(
        &self,
        id: TestimonialId,
        status: TestimonialStatus,
    ) -> Result<Testimonial, RepositoryError> {
        let row = sqlx::query_as::<_, TestimonialRow>(&format!(
            "UPDATE testimonials SET status = $1 WHERE id = $2
             RETURNING {TESTIMONIAL_COLUMNS}"
        ))
        .bind(status.to_string())
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }
}
