//! Coupon repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use ecoshop_core::{CouponId, DiscountType};

use super::RepositoryError;
use crate::models::coupon::Coupon;

/// Internal row type for coupon queries.
#[derive(Debug, sqlx::FromRow)]
struct CouponRow {
    id: i32,
    code: String,
    description: Option<String>,
    discount_type: String,
    discount_value: Decimal,
    min_purchase: Decimal,
    max_discount: Option<Decimal>,
    usage_limit: Option<i32>,
    used_count: i32,
    expiry_date: Option<DateTime<Utc>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = RepositoryError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        let discount_type = row.discount_type.parse::<DiscountType>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid discount type in database: {e}"))
        })?;

        Ok(Self {
            id: CouponId::new(row.id),
            code: row.code,
            description: row.description,
            discount_type,
            discount_value: row.discount_value,
            min_purchase: row.min_purchase,
            max_discount: row.max_discount,
            usage_limit: row.usage_limit,
            used_count: row.used_count,
            expiry_date: row.expiry_date,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Fields for creating or updating a coupon.
#[derive(Debug, Clone)]
pub struct CouponInput {
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_purchase: Decimal,
    pub max_discount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub is_active: bool,
}

const COUPON_COLUMNS: &str = "id, code, description, discount_type, discount_value, min_purchase, \
     max_discount, usage_limit, used_count, expiry_date, is_active, created_at, updated_at";

/// Repository for coupon database operations.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new coupon repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a coupon by its code (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons WHERE code = $1"
        ))
        .bind(code.to_uppercase())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List all coupons, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Coupon>, RepositoryError> {
        let rows = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// List active, unexpired coupons for the public endpoint.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Coupon>, RepositoryError> {
        let rows = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons
             WHERE is_active AND (expiry_date IS NULL OR expiry_date > now())
             ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Create a new coupon. The code is stored uppercase.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, input: &CouponInput) -> Result<Coupon, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "INSERT INTO coupons (code, description, discount_type, discount_value,
                                  min_purchase, max_discount, usage_limit, expiry_date, is_active)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COUPON_COLUMNS}"
        ))
        .bind(input.code.to_uppercase())
        .bind(&input.description)
        .bind(input.discount_type.to_string())
        .bind(input.discount_value)
        .bind(input.min_purchase)
        .bind(input.max_discount)
        .bind(input.usage_limit)
        .bind(input.expiry_date)
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "coupon code already exists"))?;

        row.try_into()
    }

    /// Update an existing coupon.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the coupon doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new code collides.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: CouponId,
        input: &CouponInput,
    ) -> Result<Coupon, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "UPDATE coupons
             SET code = $1, description = $2, discount_type = $3, discount_value = $4,
                 min_purchase = $5, max_discount = $6, usage_limit = $7, expiry_date = $8,
                 is_active = $9, updated_at = now()
             WHERE id = $10
             RETURNING {COUPON_COLUMNS}"
        ))
        .bind(input.code.to_uppercase())
        .bind(&input.description)
        .bind(input.discount_type.to_string())
        .bind(input.discount_value)
        .bind(input.min_purchase)
        .bind(input.max_discount)
        .bind(input.usage_limit)
        .bind(input.expiry_date)
        .bind(input.is_active)
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "coupon code already exists"))?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Delete a coupon.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the coupon doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, id: CouponId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM coupons WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Increment a coupon's usage count, bounded by its usage limit.
    ///
    /// The increment is conditional so `used_count` can never pass
    /// `usage_limit` under concurrent applies.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the limit is already reached.
    /// Returns `RepositoryError::NotFound` if the code is unknown.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn increment_usage(&self, code: &str) -> Result<Coupon, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "UPDATE coupons
             SET used_count = used_count + 1, updated_at = now()
             WHERE code = $1 AND (usage_limit IS NULL OR used_count < usage_limit)
             RETURNING {COUPON_COLUMNS}"
        ))
        .bind(code.to_uppercase())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => r.try_into(),
            None => {
                // Distinguish an unknown code from an exhausted one.
                if self.get_by_code(code).await?.is_some() {
                    Err(RepositoryError::Conflict(
                        "coupon has reached its usage limit".to_owned(),
                    ))
                } else {
                    Err(RepositoryError::NotFound)
                }
            }
        }
    }
}
