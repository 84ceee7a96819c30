//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness
//! GET  /health/ready                    - DB readiness
//!
//! # Auth
//! POST /api/auth/register               - Create account
//! POST /api/auth/login                  - Issue bearer token
//! POST /api/auth/logout                 - Revoke token
//! GET  /api/auth/me                     - Current user
//!
//! # Catalog
//! GET    /api/products                  - Listing with filters
//! GET    /api/products/{id}             - Product detail
//! POST   /api/products                  - Create (admin)
//! PUT    /api/products/{id}             - Update (admin)
//! DELETE /api/products/{id}             - Delete (admin)
//! GET    /api/products/{id}/ratings     - Ratings + summary
//! POST   /api/products/{id}/ratings     - Upsert own rating
//!
//! # Orders
//! POST  /api/orders/create              - Create order
//! GET   /api/orders                     - All orders (admin)
//! GET   /api/orders/my-orders           - Own orders
//! GET   /api/orders/{id}/tracking       - Status timeline
//! PATCH /api/orders/{id}/status         - Transition status (admin)
//!
//! # Payments (mock gateway)
//! POST /api/mpesa/stkpush               - Initiate simulated payment
//! POST /api/mpesa/callback              - Gateway result webhook
//! POST /api/mpesa/query                 - Transaction status poll
//!
//! # Coupons
//! POST   /api/coupons/validate          - Compute discount (public)
//! POST   /api/coupons/apply             - Record one use
//! GET    /api/coupons/active            - Active coupons (public)
//! GET    /api/coupons                   - All coupons (admin)
//! POST   /api/coupons                   - Create (admin)
//! PUT    /api/coupons/{id}              - Update (admin)
//! DELETE /api/coupons/{id}              - Delete (admin)
//!
//! # Notifications / Wishlist / Testimonials / Messages / Newsletter
//! (see the per-module route tables)
//! ```

pub mod auth;
pub mod coupons;
pub mod messages;
pub mod mpesa;
pub mod newsletter;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod ratings;
pub mod testimonials;
pub mod wishlist;

use axum::Router;

use crate::state::AppState;

/// Compose the full API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth::router())
        .nest("/api/products", products::router().merge(ratings::router()))
        .nest("/api/orders", orders::router())
        .nest("/api/coupons", coupons::router())
        .nest("/api/mpesa", mpesa::router())
        .nest("/api/notifications", notifications::router())
        .nest("/api/wishlist", wishlist::router())
        .nest("/api/testimonials", testimonials::router())
        .nest("/api/messages", messages::router())
        .nest("/api/newsletter", newsletter::router())
}
