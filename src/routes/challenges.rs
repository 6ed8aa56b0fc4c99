use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::domain::challenge::{
    self, Challenge, ChallengePatch, ChallengeProgress, ChallengeWithProgress, Completion,
    NewChallenge,
};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, HeaderTenant, JsonBody};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/challenges", get(list))
        .route("/challenges/progress", get(progress))
        .route("/challenges/{id}/start", post(start))
        .route("/challenges/{id}/complete", post(complete))
        .route("/challenges/admin", post(create))
        .route("/challenges/admin/{id}", put(update).patch(update))
}

async fn list(
    State(state): State<AppState>,
    HeaderTenant(code): HeaderTenant,
) -> AppResult<Json<Vec<ChallengeWithProgress>>> {
    Ok(Json(challenge::list_for_tenant(&state.db, &code)?))
}

async fn progress(
    State(state): State<AppState>,
    HeaderTenant(code): HeaderTenant,
) -> AppResult<Json<Vec<ChallengeProgress>>> {
    Ok(Json(state.store.list(&code, &[])?))
}

async fn start(
    State(state): State<AppState>,
    HeaderTenant(code): HeaderTenant,
    Path(id): Path<i64>,
) -> AppResult<Json<ChallengeProgress>> {
    let progress = challenge::start(&state.db, &code, id)?;
    tracing::info!(
        "Challenge {} started (progress {}, couple {})",
        id,
        progress.id,
        code.redacted()
    );
    Ok(Json(progress))
}

/// The body is optional; an empty one completes without data.
async fn complete(
    State(state): State<AppState>,
    HeaderTenant(code): HeaderTenant,
    Path(id): Path<i64>,
    body: Bytes,
) -> AppResult<Json<ChallengeProgress>> {
    let completion: Completion = if body.iter().all(u8::is_ascii_whitespace) {
        Completion::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::BadRequest(e.to_string()))?
    };

    let progress = challenge::complete(&state.db, &code, id, completion)?;
    tracing::info!(
        "Challenge {} completed (progress {}, couple {})",
        id,
        progress.id,
        code.redacted()
    );
    Ok(Json(progress))
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(new): JsonBody<NewChallenge>,
) -> AppResult<(StatusCode, Json<Challenge>)> {
    let created = challenge::create(&state.db, &new)?;
    tracing::info!("Challenge {} added by user {}", created.id, user.id);
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<i64>,
    JsonBody(patch): JsonBody<ChallengePatch>,
) -> AppResult<Json<Challenge>> {
    Ok(Json(challenge::update(&state.db, id, patch)?))
}
