//! Account and session handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::middleware::RequireUser;
use crate::models::user::PublicUser;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

/// Request to create an account.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request to log in.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response carrying the bearer token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Simple acknowledgement body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Create an account.
///
/// # Errors
///
/// 400 on invalid input, 409 on a duplicate email.
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_owned()));
    }

    let auth = AuthService::new(state.pool(), state.config().session_ttl_days);
    let user = auth.register(&body.name, &body.email, &body.password).await?;

    Ok((StatusCode::CREATED, Json(user.to_public())))
}

/// Log in and mint a bearer token.
///
/// # Errors
///
/// 401 on wrong credentials.
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let auth = AuthService::new(state.pool(), state.config().session_ttl_days);
    let outcome = auth.login(&body.email, &body.password).await?;

    Ok(Json(LoginResponse {
        token: outcome.token,
        user: outcome.user.to_public(),
    }))
}

/// Revoke the caller's bearer token.
async fn logout(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> Result<Json<MessageResponse>, AppError> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".to_owned()))?;

    let auth = AuthService::new(state.pool(), state.config().session_ttl_days);
    auth.logout(token).await?;

    Ok(Json(MessageResponse {
        message: "Logged out".to_owned(),
    }))
}

/// Current authenticated user.
async fn me(RequireUser(user): RequireUser) -> Json<PublicUser> {
    Json(user.to_public())
}
