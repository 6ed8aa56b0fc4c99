use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::domain::activity::{
    Activity, ActivityFilter, ActivityPatch, Category, Cost, Difficulty, NewActivity, Season,
};
use crate::error::AppResult;
use crate::extractors::{JsonBody, Params, QueryTenant};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/activities", get(list).post(create))
        .route("/activities/categories", get(categories))
        .route("/activities/difficulties", get(difficulties))
        .route("/activities/costs", get(costs))
        .route("/activities/seasons", get(seasons))
        .route("/activities/{id}", get(fetch).put(update).patch(update))
}

async fn list(
    State(state): State<AppState>,
    QueryTenant(code): QueryTenant,
    Params(filter): Params<ActivityFilter>,
) -> AppResult<Json<Vec<Activity>>> {
    let activities = state.store.list(&code, &filter.to_filters())?;
    Ok(Json(activities))
}

async fn create(
    State(state): State<AppState>,
    QueryTenant(code): QueryTenant,
    JsonBody(new): JsonBody<NewActivity>,
) -> AppResult<(StatusCode, Json<Activity>)> {
    let activity: Activity = state.store.create(&code, new)?;
    tracing::info!("Activity {} created for {}", activity.id, code.redacted());
    Ok((StatusCode::CREATED, Json(activity)))
}

async fn fetch(
    State(state): State<AppState>,
    QueryTenant(code): QueryTenant,
    Path(id): Path<i64>,
) -> AppResult<Json<Activity>> {
    Ok(Json(state.store.get(&code, id)?))
}

async fn update(
    State(state): State<AppState>,
    QueryTenant(code): QueryTenant,
    Path(id): Path<i64>,
    JsonBody(patch): JsonBody<ActivityPatch>,
) -> AppResult<Json<Activity>> {
    let activity: Activity = state.store.update(&code, id, patch)?;
    Ok(Json(activity))
}

async fn categories() -> Json<Vec<&'static str>> {
    Json(Category::ALL.iter().map(|c| c.as_str()).collect())
}

async fn difficulties() -> Json<Vec<&'static str>> {
    Json(Difficulty::ALL.iter().map(|d| d.as_str()).collect())
}

async fn costs() -> Json<Vec<&'static str>> {
    Json(Cost::ALL.iter().map(|c| c.as_str()).collect())
}

async fn seasons() -> Json<Vec<&'static str>> {
    Json(Season::ALL.iter().map(|s| s.as_str()).collect())
}
