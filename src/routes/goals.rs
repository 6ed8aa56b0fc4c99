use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;

use crate::domain::goal::{Goal, GoalPatch, NewGoal};
use crate::error::AppResult;
use crate::extractors::{HeaderTenant, JsonBody, Params};
use crate::routes::{deleted, PartnerQuery};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/goals", get(list).post(create))
        .route(
            "/goals/{id}",
            get(fetch).put(update).patch(update).delete(remove),
        )
}

async fn list(
    State(state): State<AppState>,
    HeaderTenant(code): HeaderTenant,
) -> AppResult<Json<Vec<Goal>>> {
    Ok(Json(state.store.list(&code, &[])?))
}

async fn create(
    State(state): State<AppState>,
    HeaderTenant(code): HeaderTenant,
    Params(partner): Params<PartnerQuery>,
    JsonBody(mut new): JsonBody<NewGoal>,
) -> AppResult<(StatusCode, Json<Goal>)> {
    new.created_by = partner.partner_id;
    let goal: Goal = state.store.create(&code, new)?;
    Ok((StatusCode::CREATED, Json(goal)))
}

async fn fetch(
    State(state): State<AppState>,
    HeaderTenant(code): HeaderTenant,
    Path(id): Path<i64>,
) -> AppResult<Json<Goal>> {
    Ok(Json(state.store.get(&code, id)?))
}

async fn update(
    State(state): State<AppState>,
    HeaderTenant(code): HeaderTenant,
    Path(id): Path<i64>,
    JsonBody(patch): JsonBody<GoalPatch>,
) -> AppResult<Json<Goal>> {
    let goal: Goal = state.store.update(&code, id, patch)?;
    Ok(Json(goal))
}

async fn remove(
    State(state): State<AppState>,
    HeaderTenant(code): HeaderTenant,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    state.store.delete::<Goal>(&code, id)?;
    Ok(deleted())
}
