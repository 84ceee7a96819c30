//! Newsletter handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;

use ecoshop_core::Email;

use crate::db::NewsletterRepository;
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::newsletter::NewsletterSubscriber;
use crate::state::AppState;

/// Build the newsletter router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/subscribe", post(subscribe))
        .route("/unsubscribe", post(unsubscribe))
        .route("/subscribers", get(list_subscribers))
}

/// Request carrying the email to (un)subscribe.
#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

/// Subscribe an email (idempotent re-subscribe).
async fn subscribe(
    State(state): State<AppState>,
    Json(body): Json<EmailRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let email = Email::parse(&body.email)
        .map_err(|e| AppError::Validation(format!("Invalid email: {e}")))?;

    let repo = NewsletterRepository::new(state.pool());
    let already_active = repo
        .get_by_email(&email)
        .await?
        .is_some_and(|subscriber| subscriber.is_active);

    if already_active {
        return Err(AppError::Validation(
            "This email is already subscribed to our newsletter".to_owned(),
        ));
    }

    let subscriber = repo.subscribe(&email).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Successfully subscribed!",
            "email": subscriber.email,
        })),
    ))
}

/// Unsubscribe an email.
async fn unsubscribe(
    State(state): State<AppState>,
    Json(body): Json<EmailRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let email = Email::parse(&body.email)
        .map_err(|e| AppError::Validation(format!("Invalid email: {e}")))?;

    let repo = NewsletterRepository::new(state.pool());
    let subscriber = repo
        .get_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("Email not found in our newsletter list".to_owned()))?;

    if !subscriber.is_active {
        return Err(AppError::Validation(
            "This email is already unsubscribed".to_owned(),
        ));
    }

    repo.unsubscribe(&email).await?;

    Ok(Json(serde_json::json!({
        "message": "Successfully unsubscribed from newsletter"
    })))
}

/// List active subscribers (admin).
async fn list_subscribers(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<NewsletterSubscriber>>, AppError> {
    Ok(Json(NewsletterRepository::new(state.pool()).list_active().await?))
}
