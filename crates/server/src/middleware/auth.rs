//! Authentication extractors.
//!
//! Bearer-token authentication: handlers declare what they need
//! (`RequireUser`, `RequireModerator`, `RequireAdmin`) and the extractor
//! resolves the `Authorization: Bearer <token>` header against the session
//! table.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn protected_handler(
//!     RequireUser(user): RequireUser,
//! ) -> impl IntoResponse {
//!     format!("Hello, {}!", user.name)
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::user::User;
use crate::state::AppState;

/// Extractor that requires an authenticated user.
pub struct RequireUser(pub User);

/// Extractor that requires a moderator or admin.
pub struct RequireModerator(pub User);

/// Extractor that requires an admin.
pub struct RequireAdmin(pub User);

/// Pull the bearer token out of the Authorization header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolve the request's bearer token into a user.
async fn authenticate(parts: &Parts, state: &AppState) -> Result<User, AppError> {
    let token = bearer_token(parts)
        .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".to_owned()))?;

    UserRepository::new(state.pool())
        .get_session_user(token)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Not authorized, token failed".to_owned()))
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(authenticate(parts, state).await?))
    }
}

impl FromRequestParts<AppState> for RequireModerator {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state).await?;
        if !user.role.is_moderator() {
            return Err(AppError::Forbidden(
                "Access denied: Moderators only".to_owned(),
            ));
        }
        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state).await?;
        if !user.role.is_admin() {
            return Err(AppError::Forbidden("Access denied: Admins only".to_owned()));
        }
        Ok(Self(user))
    }
}
