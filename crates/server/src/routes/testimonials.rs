//! Testimonial handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
};
use serde::{Deserialize, Serialize};

use ecoshop_core::{TestimonialId, TestimonialStatus};

use crate::db::TestimonialRepository;
use crate::error::AppError;
use crate::middleware::{RequireModerator, RequireUser};
use crate::models::testimonial::Testimonial;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 10;

/// Build the testimonials router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_approved).post(submit))
        .route("/all", get(list_all))
        .route("/{id}/status", patch(set_status))
}

/// Request to submit a testimonial.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub comment: String,
    pub rating: i32,
    pub role: Option<String>,
}

/// Query parameters for the public list.
#[derive(Debug, Deserialize, Default)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

/// Public list response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub total: usize,
    pub testimonials: Vec<Testimonial>,
}

/// Request to moderate a testimonial.
#[derive(Debug, Deserialize)]
pub struct ModerateRequest {
    pub status: TestimonialStatus,
}

/// Submit a testimonial; it awaits moderation.
async fn submit(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Json(body): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    if body.comment.trim().is_empty() {
        return Err(AppError::Validation("Comment is required".to_owned()));
    }
    if !(1..=5).contains(&body.rating) {
        return Err(AppError::Validation(
            "Rating must be between 1 and 5".to_owned(),
        ));
    }

    let testimonial = TestimonialRepository::new(state.pool())
        .create(
            user.id,
            &user.name,
            body.role.as_deref().unwrap_or("Customer"),
            body.comment.trim(),
            body.rating,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Thank you for your testimonial! It will be reviewed and published soon.",
            "testimonial": testimonial,
        })),
    ))
}

/// Approved testimonials (public).
async fn list_approved(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 100);
    let testimonials = TestimonialRepository::new(state.pool())
        .list_approved(limit)
        .await?;

    Ok(Json(ListResponse {
        total: testimonials.len(),
        testimonials,
    }))
}

/// Every testimonial, for the moderation queue.
async fn list_all(
    RequireModerator(_moderator): RequireModerator,
    State(state): State<AppState>,
) -> Result<Json<Vec<Testimonial>>, AppError> {
    Ok(Json(TestimonialRepository::new(state.pool()).list_all().await?))
}

/// Approve or reject a testimonial.
async fn set_status(
    RequireModerator(_moderator): RequireModerator,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<ModerateRequest>,
) -> Result<Json<Testimonial>, AppError> {
    let testimonial = TestimonialRepository::new(state.pool())
        .set_status(TestimonialId::new(id), body.status)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => {
                AppError::NotFound("Testimonial not found".to_owned())
            }
            other => other.into(),
        })?;

    Ok(Json(testimonial))
}
