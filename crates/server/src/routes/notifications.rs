//! Notification handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
};
use serde::{Deserialize, Serialize};

use ecoshop_core::NotificationId;

use crate::db::NotificationRepository;
use crate::db::notifications::NewNotification;
use crate::error::AppError;
use crate::middleware::{RequireAdmin, RequireUser};
use crate::models::notification::Notification;
use crate::services::events::AppEvent;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 10;

/// Build the notifications router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications).post(create_notification))
        .route("/read-all", patch(mark_all_read))
        .route("/{id}/read", patch(mark_read))
        .route("/{id}", axum::routing::delete(delete_notification))
}

/// Query parameters for listing notifications.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub unread_only: Option<bool>,
}

/// Listing response with the unread badge count.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub data: Vec<Notification>,
    pub unread_count: i64,
}

/// Request to create a notification (admin/internal tooling).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub user_id: i32,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
}

/// List the caller's notifications.
async fn list_notifications(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, AppError> {
    let repo = NotificationRepository::new(state.pool());
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 100);

    let data = repo
        .list_for_user(user.id, query.unread_only.unwrap_or(false), limit)
        .await?;
    let unread_count = repo.unread_count(user.id).await?;

    Ok(Json(ListResponse { data, unread_count }))
}

/// Create a notification for a user (admin).
async fn create_notification(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<CreateRequest>,
) -> Result<(StatusCode, Json<Notification>), AppError> {
    if body.title.trim().is_empty() || body.message.trim().is_empty() {
        return Err(AppError::Validation(
            "userId, type, title, and message are required".to_owned(),
        ));
    }

    let notification = NotificationRepository::new(state.pool())
        .append(&NewNotification {
            user_id: body.user_id.into(),
            kind: body.kind,
            title: body.title,
            message: body.message,
            link: body.link,
        })
        .await?;

    state.events().publish(AppEvent::Notification {
        user_id: notification.user_id,
        title: notification.title.clone(),
        message: notification.message.clone(),
    });

    Ok((StatusCode::CREATED, Json(notification)))
}

/// Mark one notification as read.
async fn mark_read(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Notification>, AppError> {
    let notification = NotificationRepository::new(state.pool())
        .mark_read(NotificationId::new(id), user.id)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => {
                AppError::NotFound("Notification not found".to_owned())
            }
            other => other.into(),
        })?;

    Ok(Json(notification))
}

/// Mark all of the caller's notifications as read.
async fn mark_all_read(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let updated = NotificationRepository::new(state.pool())
        .mark_all_read(user.id)
        .await?;

    Ok(Json(serde_json::json!({
        "message": "All notifications marked as read",
        "updated": updated,
    })))
}

/// Delete one of the caller's notifications.
async fn delete_notification(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    NotificationRepository::new(state.pool())
        .delete(NotificationId::new(id), user.id)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => {
                AppError::NotFound("Notification not found".to_owned())
            }
            other => other.into(),
        })?;

    Ok(StatusCode::NO_CONTENT)
}
