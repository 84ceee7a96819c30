//! Wishlist domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use ecoshop_core::{ProductId, UserId, WishlistItemId};

use super::Product;

/// A wishlist entry, joined with its product for API responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub id: WishlistItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub product: Product,
    pub created_at: DateTime<Utc>,
}
