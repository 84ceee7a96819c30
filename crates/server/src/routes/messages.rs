//! Direct-message handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use serde::Deserialize;

use ecoshop_core::UserId;

use crate::db::{MessageRepository, UserRepository};
use crate::error::AppError;
use crate::middleware::RequireUser;
use crate::models::message::{Conversation, Message};
use crate::services::events::AppEvent;
use crate::state::AppState;

/// Build the messages router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(send_message))
        .route("/conversations", get(conversations))
        .route("/{peer_id}", get(thread))
        .route("/{peer_id}/read", patch(mark_thread_read))
}

/// Request to send a message.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub receiver_id: i32,
    pub message: String,
}

/// Send a direct message to another user.
async fn send_message(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Json(body): Json<SendRequest>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    if body.message.trim().is_empty() {
        return Err(AppError::Validation(
            "Receiver ID and message are required".to_owned(),
        ));
    }

    let receiver_id = UserId::new(body.receiver_id);
    if receiver_id == user.id {
        return Err(AppError::Validation(
            "Cannot send a message to yourself".to_owned(),
        ));
    }

    UserRepository::new(state.pool())
        .get_by_id(receiver_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipient not found".to_owned()))?;

    let message = MessageRepository::new(state.pool())
        .create(user.id, receiver_id, body.message.trim())
        .await?;

    // Live-push signal for the recipient; the row above is the source of truth.
    state.events().publish(AppEvent::Notification {
        user_id: receiver_id,
        title: format!("New message from {}", user.name),
        message: message.body.clone(),
    });

    Ok((StatusCode::CREATED, Json(message)))
}

/// Conversation heads for the caller.
async fn conversations(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Conversation>>, AppError> {
    Ok(Json(
        MessageRepository::new(state.pool())
            .conversations(user.id)
            .await?,
    ))
}

/// Full thread with one peer, oldest first.
async fn thread(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(peer_id): Path<i32>,
) -> Result<Json<Vec<Message>>, AppError> {
    Ok(Json(
        MessageRepository::new(state.pool())
            .thread(user.id, UserId::new(peer_id))
            .await?,
    ))
}

/// Mark a thread as read.
async fn mark_thread_read(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(peer_id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    let updated = MessageRepository::new(state.pool())
        .mark_thread_read(user.id, UserId::new(peer_id))
        .await?;

    Ok(Json(serde_json::json!({ "updated": updated })))
}
