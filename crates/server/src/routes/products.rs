//! Catalog handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use ecoshop_core::ProductId;

use crate::db::products::{ProductFilter, ProductInput, ProductRepository, ProductSort};
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::product::{Product, ProductWithRating};
use crate::state::AppState;

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

/// Query parameters for the public listing.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListProductsQuery {
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_rating: Option<f64>,
    pub in_stock: Option<bool>,
    pub sort_by: Option<String>,
}

/// Request body for creating or updating a product.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub stock: i32,
    pub image: Option<String>,
}

impl ProductRequest {
    fn validate(&self) -> Result<ProductInput, AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Name is required".to_owned()));
        }
        if self.price < Decimal::ZERO {
            return Err(AppError::Validation("Price cannot be negative".to_owned()));
        }
        if self.stock < 0 {
            return Err(AppError::Validation("Stock cannot be negative".to_owned()));
        }

        Ok(ProductInput {
            name: self.name.trim().to_owned(),
            description: self.description.clone(),
            price: self.price,
            category: self.category.clone(),
            stock: self.stock,
            image: self.image.clone(),
        })
    }
}

/// Public product listing with filters and rating aggregates.
async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<Vec<ProductWithRating>>, AppError> {
    let filter = ProductFilter {
        category: query.category,
        min_price: query.min_price,
        max_price: query.max_price,
        min_rating: query.min_rating,
        in_stock: query.in_stock.unwrap_or(false),
        sort: ProductSort::from_query(query.sort_by.as_deref()),
    };

    let products = ProductRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(products))
}

/// Product detail.
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Product>, AppError> {
    let product = ProductRepository::new(state.pool())
        .get_by_id(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;

    Ok(Json(product))
}

/// Create a product (admin).
async fn create_product(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<ProductRequest>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let input = body.validate()?;
    let product = ProductRepository::new(state.pool()).create(&input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Update a product (admin).
async fn update_product(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<ProductRequest>,
) -> Result<Json<Product>, AppError> {
    let input = body.validate()?;
    let product = ProductRepository::new(state.pool())
        .update(ProductId::new(id), &input)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => {
                AppError::NotFound("Product not found".to_owned())
            }
            other => other.into(),
        })?;
    Ok(Json(product))
}

/// Delete a product (admin).
async fn delete_product(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    ProductRepository::new(state.pool())
        .delete(ProductId::new(id))
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => {
                AppError::NotFound("Product not found".to_owned())
            }
            other => other.into(),
        })?;
    Ok(StatusCode::NO_CONTENT)
}
