//! Order handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use serde::{Deserialize, Serialize};

use ecoshop_core::OrderId;

use crate::error::AppError;
use crate::middleware::{RequireAdmin, RequireUser};
use crate::models::order::{Order, OrderWithItems, TrackingStep};
use crate::services::orders::{CreateOrder, OrderLine};
use crate::state::AppState;

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/create", post(create_order))
        .route("/my-orders", get(my_orders))
        .route("/{id}/tracking", get(order_tracking))
        .route("/{id}/status", patch(update_status))
}

/// One requested line item.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: i32,
    pub quantity: i32,
    /// Client-side price hint. Advisory only: the catalog price at creation
    /// time is what gets denormalized onto the order.
    #[serde(default)]
    pub unit_price_hint: Option<rust_decimal::Decimal>,
}

/// Request to create an order.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemRequest>,
    pub shipping_address: String,
    pub payment_method: String,
    pub coupon_code: Option<String>,
}

/// Response after creating an order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub message: String,
    pub order_number: String,
    pub order: OrderWithItems,
}

/// Request to transition an order's status.
///
/// The status arrives as a raw string on purpose: validation against the
/// defined values is the operation's contract.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Response for a status update.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusResponse {
    pub message: String,
    pub order: Order,
}

/// Tracking timeline response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingResponse {
    pub order: OrderWithItems,
    pub timeline: Vec<TrackingStep>,
}

/// Create an order from the caller's cart.
async fn create_order(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), AppError> {
    let request = CreateOrder {
        items: body
            .items
            .into_iter()
            .map(|item| OrderLine {
                product_id: item.product_id.into(),
                quantity: item.quantity,
            })
            .collect(),
        shipping_address: body.shipping_address,
        payment_method: body.payment_method,
        coupon_code: body.coupon_code,
    };

    let created = state.orders().create_order(&user, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            message: "Order created successfully".to_owned(),
            order_number: created.order.order_number.to_string(),
            order: created,
        }),
    ))
}

/// All orders, newest first (admin).
async fn list_orders(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderWithItems>>, AppError> {
    Ok(Json(state.orders().list_all().await?))
}

/// The caller's own orders.
async fn my_orders(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderWithItems>>, AppError> {
    Ok(Json(state.orders().list_for_user(user.id).await?))
}

/// Status timeline for an order (owner or staff).
async fn order_tracking(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<TrackingResponse>, AppError> {
    let (order, timeline) = state.orders().tracking(OrderId::new(id), &user).await?;
    Ok(Json(TrackingResponse { order, timeline }))
}

/// Transition an order's status (admin).
async fn update_status(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<UpdateStatusResponse>, AppError> {
    let order = state
        .orders()
        .update_order_status(OrderId::new(id), &body.status)
        .await?;

    Ok(Json(UpdateStatusResponse {
        message: "Order status updated successfully".to_owned(),
        order,
    }))
}
