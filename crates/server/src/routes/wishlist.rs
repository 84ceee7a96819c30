//! Wishlist handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;

use ecoshop_core::ProductId;

use crate::db::{ProductRepository, WishlistRepository};
use crate::error::AppError;
use crate::middleware::RequireUser;
use crate::models::wishlist::WishlistItem;
use crate::state::AppState;

/// Build the wishlist router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_wishlist).post(add_to_wishlist).delete(clear_wishlist))
        .route("/{product_id}", axum::routing::delete(remove_from_wishlist))
}

/// Request to add a product to the wishlist.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRequest {
    pub product_id: i32,
}

/// The caller's wishlist, with product details.
async fn list_wishlist(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<WishlistItem>>, AppError> {
    Ok(Json(
        WishlistRepository::new(state.pool())
            .list_for_user(user.id)
            .await?,
    ))
}

/// Add a product to the caller's wishlist.
async fn add_to_wishlist(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Json(body): Json<AddRequest>,
) -> Result<(StatusCode, Json<WishlistItem>), AppError> {
    let product_id = ProductId::new(body.product_id);

    ProductRepository::new(state.pool())
        .get_by_id(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;

    let item = WishlistRepository::new(state.pool())
        .add(user.id, product_id)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::Conflict(_) => {
                AppError::Conflict("Product already in wishlist".to_owned())
            }
            other => other.into(),
        })?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// Remove a product from the caller's wishlist.
async fn remove_from_wishlist(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    WishlistRepository::new(state.pool())
        .remove(user.id, ProductId::new(product_id))
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => {
                AppError::NotFound("Item not found in wishlist".to_owned())
            }
            other => other.into(),
        })?;

    Ok(Json(serde_json::json!({ "message": "Removed from wishlist" })))
}

/// Clear the caller's wishlist.
async fn clear_wishlist(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    WishlistRepository::new(state.pool()).clear(user.id).await?;
    Ok(Json(serde_json::json!({ "message": "Wishlist cleared" })))
}
