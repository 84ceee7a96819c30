//! Product rating domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use ecoshop_core::{ProductId, RatingId, UserId};

/// A single user's rating of a product (one per user/product pair).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: RatingId,
    pub user_id: UserId,
    pub product_id: ProductId,
    /// Stars, 1 through 5.
    pub rating: i32,
    pub review: Option<String>,
    /// Display name of the rating author.
    pub user_name: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregate rating for a product.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub average_rating: f64,
    pub total_ratings: i64,
}

impl RatingSummary {
    /// Empty aggregate for an unrated product.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            average_rating: 0.0,
            total_ratings: 0,
        }
    }
}
