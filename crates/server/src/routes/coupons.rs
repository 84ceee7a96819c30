//! Coupon handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ecoshop_core::{CouponId, DiscountType};

use crate::db::coupons::{CouponInput, CouponRepository};
use crate::error::AppError;
use crate::middleware::{RequireAdmin, RequireUser};
use crate::models::coupon::Coupon;
use crate::services::coupons::CouponService;
use crate::state::AppState;

/// Build the coupons router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_coupons).post(create_coupon))
        .route("/active", get(list_active))
        .route("/validate", post(validate_coupon))
        .route("/apply", post(apply_coupon))
        .route("/{id}", axum::routing::put(update_coupon).delete(delete_coupon))
}

/// Request to validate a coupon against an order total.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub code: String,
    pub order_total: Decimal,
}

/// Slimmed coupon view inside the validation response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponSummary {
    pub id: CouponId,
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
}

/// Validation response: the discount and resulting total.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub valid: bool,
    pub coupon: CouponSummary,
    pub discount: Decimal,
    pub final_total: Decimal,
}

/// Request to record one use of a coupon.
#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub code: String,
}

/// Request to create or update a coupon.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponRequest {
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    #[serde(default)]
    pub min_purchase: Option<Decimal>,
    pub max_discount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl CouponRequest {
    fn validate(&self) -> Result<CouponInput, AppError> {
        if self.code.trim().is_empty() {
            return Err(AppError::Validation("Coupon code is required".to_owned()));
        }
        if self.discount_value <= Decimal::ZERO {
            return Err(AppError::Validation(
                "Discount value must be positive".to_owned(),
            ));
        }
        if self.usage_limit.is_some_and(|limit| limit <= 0) {
            return Err(AppError::Validation(
                "Usage limit must be positive".to_owned(),
            ));
        }

        Ok(CouponInput {
            code: self.code.trim().to_owned(),
            description: self.description.clone(),
            discount_type: self.discount_type,
            discount_value: self.discount_value,
            min_purchase: self.min_purchase.unwrap_or(Decimal::ZERO),
            max_discount: self.max_discount,
            usage_limit: self.usage_limit,
            expiry_date: self.expiry_date,
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

/// Validate a code and quote the discount (public).
async fn validate_coupon(
    State(state): State<AppState>,
    Json(body): Json<ValidateRequest>,
) -> Result<Json<ValidateResponse>, AppError> {
    if body.code.trim().is_empty() {
        return Err(AppError::Validation(
            "Coupon code and order total are required".to_owned(),
        ));
    }

    let quote = CouponService::new(state.pool())
        .validate(&body.code, body.order_total)
        .await?;

    Ok(Json(ValidateResponse {
        valid: true,
        coupon: CouponSummary {
            id: quote.coupon.id,
            code: quote.coupon.code.clone(),
            description: quote.coupon.description.clone(),
            discount_type: quote.coupon.discount_type,
            discount_value: quote.coupon.discount_value,
        },
        discount: quote.discount,
        final_total: quote.final_total,
    }))
}

/// Record one use of a coupon.
async fn apply_coupon(
    RequireUser(_user): RequireUser,
    State(state): State<AppState>,
    Json(body): Json<ApplyRequest>,
) -> Result<Json<Coupon>, AppError> {
    let coupon = CouponService::new(state.pool()).apply(&body.code).await?;
    Ok(Json(coupon))
}

/// All coupons (admin).
async fn list_coupons(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Coupon>>, AppError> {
    Ok(Json(CouponRepository::new(state.pool()).list_all().await?))
}

/// Active coupons (public).
async fn list_active(State(state): State<AppState>) -> Result<Json<Vec<Coupon>>, AppError> {
    Ok(Json(CouponRepository::new(state.pool()).list_active().await?))
}

/// Create a coupon (admin).
async fn create_coupon(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<CouponRequest>,
) -> Result<(StatusCode, Json<Coupon>), AppError> {
    let input = body.validate()?;
    let coupon = CouponRepository::new(state.pool()).create(&input).await?;
    Ok((StatusCode::CREATED, Json(coupon)))
}

/// Update a coupon (admin).
async fn update_coupon(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<CouponRequest>,
) -> Result<Json<Coupon>, AppError> {
    let input = body.validate()?;
    let coupon = CouponRepository::new(state.pool())
        .update(CouponId::new(id), &input)
        .await?;
    Ok(Json(coupon))
}

/// Delete a coupon (admin).
async fn delete_coupon(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    CouponRepository::new(state.pool())
        .delete(CouponId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
