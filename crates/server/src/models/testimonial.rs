//! Testimonial domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use ecoshop_core::{TestimonialId, TestimonialStatus, UserId};

/// A customer testimonial, published only after moderation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: TestimonialId,
    pub user_id: UserId,
    /// Display name captured at submission time.
    pub name: String,
    pub role: String,
    pub comment: String,
    /// Stars, 1 through 5.
    pub rating: i32,
    pub status: TestimonialStatus,
    pub created_at: DateTime<Utc>,
}
