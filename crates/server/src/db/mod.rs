//! Database operations for the EcoShop `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users` / `sessions` - Accounts and bearer-token sessions
//! - `products` - Catalog
//! - `orders` / `order_items` - Orders and their line items
//! - `coupons` - Discount codes
//! - `notifications` - Per-user persisted notifications
//! - `wishlist_items` - Wishlist entries
//! - `ratings` - Product ratings
//! - `testimonials` - Moderated testimonials
//! - `messages` - Direct messages
//! - `newsletter_subscribers` - Newsletter list
//!
//! # Migrations
//!
//! Migrations live in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p ecoshop-cli -- migrate
//! ```
//!
//! Queries use the runtime-checked sqlx API (not the compile-time macros) so
//! the workspace builds without a live database; every query goes through a
//! typed row struct and a `TryFrom` conversion into a domain model.

pub mod coupons;
pub mod messages;
pub mod newsletter;
pub mod notifications;
pub mod products;
pub mod ratings;
pub mod testimonials;
pub mod users;
pub mod wishlists;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use coupons::CouponRepository;
pub use messages::MessageRepository;
pub use newsletter::NewsletterRepository;
pub use notifications::NotificationRepository;
pub use products::ProductRepository;
pub use ratings::RatingRepository;
pub use testimonials::TestimonialRepository;
pub use users::UserRepository;
pub use wishlists::WishlistRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a sqlx error, converting unique violations into [`Self::Conflict`].
    pub(crate) fn from_sqlx(err: sqlx::Error, conflict_message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict_message.to_owned());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
