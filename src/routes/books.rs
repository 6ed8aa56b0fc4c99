use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::domain::book::{Book, BookPatch, NewBook};
use crate::error::AppResult;
use crate::extractors::{JsonBody, QueryTenant};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/books", get(list).post(create))
        .route("/books/{id}", get(fetch).put(update).patch(update))
}

async fn list(
    State(state): State<AppState>,
    QueryTenant(code): QueryTenant,
) -> AppResult<Json<Vec<Book>>> {
    Ok(Json(state.store.list(&code, &[])?))
}

async fn create(
    State(state): State<AppState>,
    QueryTenant(code): QueryTenant,
    JsonBody(new): JsonBody<NewBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let book: Book = state.store.create(&code, new)?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn fetch(
    State(state): State<AppState>,
    QueryTenant(code): QueryTenant,
    Path(id): Path<i64>,
) -> AppResult<Json<Book>> {
    Ok(Json(state.store.get(&code, id)?))
}

async fn update(
    State(state): State<AppState>,
    QueryTenant(code): QueryTenant,
    Path(id): Path<i64>,
    JsonBody(patch): JsonBody<BookPatch>,
) -> AppResult<Json<Book>> {
    let book: Book = state.store.update(&code, id, patch)?;
    Ok(Json(book))
}
