use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::domain::movie::{Movie, MoviePatch, NewMovie};
use crate::error::AppResult;
use crate::extractors::{JsonBody, QueryTenant};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/movies", get(list).post(create))
        .route("/movies/{id}", get(fetch).put(update).patch(update))
}

async fn list(
    State(state): State<AppState>,
    QueryTenant(code): QueryTenant,
) -> AppResult<Json<Vec<Movie>>> {
    Ok(Json(state.store.list(&code, &[])?))
}

async fn create(
    State(state): State<AppState>,
    QueryTenant(code): QueryTenant,
    JsonBody(new): JsonBody<NewMovie>,
) -> AppResult<(StatusCode, Json<Movie>)> {
    let movie: Movie = state.store.create(&code, new)?;
    Ok((StatusCode::CREATED, Json(movie)))
}

async fn fetch(
    State(state): State<AppState>,
    QueryTenant(code): QueryTenant,
    Path(id): Path<i64>,
) -> AppResult<Json<Movie>> {
    Ok(Json(state.store.get(&code, id)?))
}

async fn update(
    State(state): State<AppState>,
    QueryTenant(code): QueryTenant,
    Path(id): Path<i64>,
    JsonBody(patch): JsonBody<MoviePatch>,
) -> AppResult<Json<Movie>> {
    let movie: Movie = state.store.update(&code, id, patch)?;
    Ok(Json(movie))
}
