//! Product domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use ecoshop_core::ProductId;

/// A catalog product.
///
/// Invariants (enforced by the schema and the conditional stock decrement):
/// `price >= 0`, `stock >= 0`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub stock: i32,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether the product can cover an order of `quantity` units.
    #[must_use]
    pub fn has_stock(&self, quantity: i32) -> bool {
        self.stock >= quantity
    }
}

/// A product joined with its rating aggregate, as returned by the listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductWithRating {
    #[serde(flatten)]
    pub product: Product,
    pub average_rating: f64,
    pub total_ratings: i64,
}
