//! Coupon validation and discount computation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::db::{CouponRepository, RepositoryError};
use crate::error::AppError;
use crate::models::coupon::Coupon;

/// Why a coupon cannot be used.
#[derive(Debug, Error)]
pub enum CouponError {
    /// Unknown code.
    #[error("Invalid coupon code")]
    NotFound,

    /// Coupon is disabled.
    #[error("This coupon is no longer active")]
    Inactive,

    /// Coupon is past its expiry date.
    #[error("This coupon has expired")]
    Expired,

    /// Usage limit reached.
    #[error("This coupon has reached its usage limit")]
    UsageLimitExceeded,

    /// Order total below the coupon's minimum purchase.
    #[error("Minimum purchase of ${min} required to use this coupon")]
    MinimumPurchase { min: Decimal },

    /// Storage failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<CouponError> for AppError {
    fn from(err: CouponError) -> Self {
        match err {
            CouponError::NotFound => Self::NotFound(err.to_string()),
            CouponError::Inactive
            | CouponError::Expired
            | CouponError::UsageLimitExceeded
            | CouponError::MinimumPurchase { .. } => Self::Validation(err.to_string()),
            CouponError::Repository(inner) => inner.into(),
        }
    }
}

/// Result of a successful validation.
#[derive(Debug, Clone)]
pub struct CouponQuote {
    pub coupon: Coupon,
    pub discount: Decimal,
    pub final_total: Decimal,
}

/// Check whether a coupon is usable for an order of `order_total` at `now`.
///
/// The checks run in the same order the errors are documented: active,
/// expiry, usage limit, minimum purchase.
pub fn check_usable(
    coupon: &Coupon,
    order_total: Decimal,
    now: DateTime<Utc>,
) -> Result<(), CouponError> {
    if !coupon.is_active {
        return Err(CouponError::Inactive);
    }
    if coupon.is_expired(now) {
        return Err(CouponError::Expired);
    }
    if coupon.is_exhausted() {
        return Err(CouponError::UsageLimitExceeded);
    }
    if order_total < coupon.min_purchase {
        return Err(CouponError::MinimumPurchase {
            min: coupon.min_purchase.round_dp(2),
        });
    }
    Ok(())
}

/// Compute the discount a coupon grants on `order_total`.
///
/// Percentage coupons take `value`% of the total, capped at `max_discount`
/// when set. Fixed coupons take `value` directly. Either way the discount
/// never exceeds the order total, so the final total floors at zero.
#[must_use]
pub fn compute_discount(coupon: &Coupon, order_total: Decimal) -> Decimal {
    let raw = match coupon.discount_type {
        ecoshop_core::DiscountType::Percentage => {
            let discount = order_total * coupon.discount_value / Decimal::ONE_HUNDRED;
            match coupon.max_discount {
                Some(cap) => discount.min(cap),
                None => discount,
            }
        }
        ecoshop_core::DiscountType::Fixed => coupon.discount_value,
    };

    raw.min(order_total).round_dp(2)
}

/// Coupon service over the repository.
pub struct CouponService<'a> {
    coupons: CouponRepository<'a>,
}

impl<'a> CouponService<'a> {
    /// Create a new coupon service.
    #[must_use]
    pub const fn new(pool: &'a sqlx::PgPool) -> Self {
        Self {
            coupons: CouponRepository::new(pool),
        }
    }

    /// Validate a code against an order total and quote the discount.
    ///
    /// # Errors
    ///
    /// Returns a [`CouponError`] naming the first failed check.
    pub async fn validate(
        &self,
        code: &str,
        order_total: Decimal,
    ) -> Result<CouponQuote, CouponError> {
        let coupon = self
            .coupons
            .get_by_code(code)
            .await?
            .ok_or(CouponError::NotFound)?;

        check_usable(&coupon, order_total, Utc::now())?;

        let discount = compute_discount(&coupon, order_total);
        let final_total = (order_total - discount).round_dp(2);

        Ok(CouponQuote {
            coupon,
            discount,
            final_total,
        })
    }

    /// Record one use of a coupon (bounded by its usage limit).
    ///
    /// # Errors
    ///
    /// Returns [`CouponError::UsageLimitExceeded`] if the limit is reached,
    /// [`CouponError::NotFound`] for unknown codes.
    pub async fn apply(&self, code: &str) -> Result<Coupon, CouponError> {
        match self.coupons.increment_usage(code).await {
            Ok(coupon) => Ok(coupon),
            Err(RepositoryError::NotFound) => Err(CouponError::NotFound),
            Err(RepositoryError::Conflict(_)) => Err(CouponError::UsageLimitExceeded),
            Err(other) => Err(CouponError::Repository(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use ecoshop_core::{CouponId, DiscountType};

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    fn coupon(discount_type: DiscountType, value: Decimal) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: CouponId::new(1),
            code: "SAVE".to_owned(),
            description: None,
            discount_type,
            discount_value: value,
            min_purchase: Decimal::ZERO,
            max_discount: None,
            usage_limit: None,
            used_count: 0,
            expiry_date: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_percentage_discount_capped_at_max() {
        let mut c = coupon(DiscountType::Percentage, dec(20));
        c.max_discount = Some(dec(10));

        let discount = compute_discount(&c, dec(100));
        assert_eq!(discount, dec(10));
        assert_eq!(dec(100) - discount, dec(90));
    }

    #[test]
    fn test_percentage_discount_uncapped() {
        let c = coupon(DiscountType::Percentage, dec(20));
        assert_eq!(compute_discount(&c, dec(50)), dec(10));
    }

    #[test]
    fn test_fixed_discount_never_exceeds_total() {
        let c = coupon(DiscountType::Fixed, dec(15));

        let discount = compute_discount(&c, dec(10));
        assert_eq!(discount, dec(10));
        assert_eq!(dec(10) - discount, Decimal::ZERO);
    }

    #[test]
    fn test_inactive_coupon_rejected() {
        let mut c = coupon(DiscountType::Fixed, dec(5));
        c.is_active = false;
        assert!(matches!(
            check_usable(&c, dec(100), Utc::now()),
            Err(CouponError::Inactive)
        ));
    }

    #[test]
    fn test_expired_coupon_rejected() {
        let mut c = coupon(DiscountType::Fixed, dec(5));
        c.expiry_date = Some(Utc::now() - Duration::days(1));
        assert!(matches!(
            check_usable(&c, dec(100), Utc::now()),
            Err(CouponError::Expired)
        ));
    }

    #[test]
    fn test_unexpired_coupon_accepted() {
        let mut c = coupon(DiscountType::Fixed, dec(5));
        c.expiry_date = Some(Utc::now() + Duration::days(1));
        assert!(check_usable(&c, dec(100), Utc::now()).is_ok());
    }

    #[test]
    fn test_usage_limit_rejected() {
        let mut c = coupon(DiscountType::Fixed, dec(5));
        c.usage_limit = Some(3);
        c.used_count = 3;
        assert!(matches!(
            check_usable(&c, dec(100), Utc::now()),
            Err(CouponError::UsageLimitExceeded)
        ));
    }

    #[test]
    fn test_minimum_purchase_rejected() {
        let mut c = coupon(DiscountType::Fixed, dec(5));
        c.min_purchase = dec(50);
        let err = check_usable(&c, Decimal::new(4999, 2), Utc::now());
        assert!(matches!(err, Err(CouponError::MinimumPurchase { .. })));
        assert!(check_usable(&c, dec(50), Utc::now()).is_ok());
    }
}
