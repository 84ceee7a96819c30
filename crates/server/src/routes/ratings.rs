//! Product rating handlers, nested under `/api/products/{id}/ratings`.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};

use ecoshop_core::ProductId;

use crate::db::{ProductRepository, RatingRepository};
use crate::error::AppError;
use crate::middleware::RequireUser;
use crate::models::rating::{Rating, RatingSummary};
use crate::state::AppState;

/// Build the ratings router (merged into the products router).
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/ratings", get(list_ratings).post(rate_product))
}

/// Request to rate a product.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRequest {
    pub rating: i32,
    pub review: Option<String>,
}

/// Ratings for a product plus the aggregate.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingsResponse {
    pub ratings: Vec<Rating>,
    #[serde(flatten)]
    pub summary: RatingSummary,
}

/// List a product's ratings with the aggregate summary.
async fn list_ratings(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<RatingsResponse>, AppError> {
    let product_id = ProductId::new(id);
    let repo = RatingRepository::new(state.pool());

    let ratings = repo.list_for_product(product_id).await?;
    let summary = if ratings.is_empty() {
        RatingSummary::empty()
    } else {
        repo.summary(product_id).await?
    };

    Ok(Json(RatingsResponse { ratings, summary }))
}

/// Upsert the caller's rating for a product.
async fn rate_product(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<RateRequest>,
) -> Result<(StatusCode, Json<Rating>), AppError> {
    if !(1..=5).contains(&body.rating) {
        return Err(AppError::Validation(
            "Rating must be between 1 and 5".to_owned(),
        ));
    }

    let product_id = ProductId::new(id);
    ProductRepository::new(state.pool())
        .get_by_id(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;

    let rating = RatingRepository::new(state.pool())
        .upsert(user.id, product_id, body.rating, body.review.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(rating)))
}
