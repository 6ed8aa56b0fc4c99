use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::domain::blog::{BlogEntry, BlogEntryPatch, NewBlogEntry};
use crate::error::AppResult;
use crate::extractors::{JsonBody, QueryTenant};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/blog-entries", get(list).post(create))
        .route("/blog-entries/{id}", get(fetch).put(update).patch(update))
}

async fn list(
    State(state): State<AppState>,
    QueryTenant(code): QueryTenant,
) -> AppResult<Json<Vec<BlogEntry>>> {
    Ok(Json(state.store.list(&code, &[])?))
}

async fn create(
    State(state): State<AppState>,
    QueryTenant(code): QueryTenant,
    JsonBody(new): JsonBody<NewBlogEntry>,
) -> AppResult<(StatusCode, Json<BlogEntry>)> {
    let entry: BlogEntry = state.store.create(&code, new)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn fetch(
    State(state): State<AppState>,
    QueryTenant(code): QueryTenant,
    Path(id): Path<i64>,
) -> AppResult<Json<BlogEntry>> {
    Ok(Json(state.store.get(&code, id)?))
}

async fn update(
    State(state): State<AppState>,
    QueryTenant(code): QueryTenant,
    Path(id): Path<i64>,
    JsonBody(patch): JsonBody<BlogEntryPatch>,
) -> AppResult<Json<BlogEntry>> {
    let entry: BlogEntry = state.store.update(&code, id, patch)?;
    Ok(Json(entry))
}
