use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;

use crate::domain::calendar::{CalendarEvent, CalendarEventPatch, CalendarRange, NewCalendarEvent};
use crate::error::AppResult;
use crate::extractors::{HeaderTenant, JsonBody, Params};
use crate::routes::{deleted, PartnerQuery};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/calendar", get(list).post(create))
        .route(
            "/calendar/{id}",
            get(fetch).put(update).patch(update).delete(remove),
        )
}

async fn list(
    State(state): State<AppState>,
    HeaderTenant(code): HeaderTenant,
    Params(range): Params<CalendarRange>,
) -> AppResult<Json<Vec<CalendarEvent>>> {
    Ok(Json(state.store.list(&code, &range.to_filters())?))
}

async fn create(
    State(state): State<AppState>,
    HeaderTenant(code): HeaderTenant,
    Params(partner): Params<PartnerQuery>,
    JsonBody(mut new): JsonBody<NewCalendarEvent>,
) -> AppResult<(StatusCode, Json<CalendarEvent>)> {
    new.created_by = partner.partner_id;
    let event: CalendarEvent = state.store.create(&code, new)?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn fetch(
    State(state): State<AppState>,
    HeaderTenant(code): HeaderTenant,
    Path(id): Path<i64>,
) -> AppResult<Json<CalendarEvent>> {
    Ok(Json(state.store.get(&code, id)?))
}

async fn update(
    State(state): State<AppState>,
    HeaderTenant(code): HeaderTenant,
    Path(id): Path<i64>,
    JsonBody(patch): JsonBody<CalendarEventPatch>,
) -> AppResult<Json<CalendarEvent>> {
    let event: CalendarEvent = state.store.update(&code, id, patch)?;
    Ok(Json(event))
}

async fn remove(
    State(state): State<AppState>,
    HeaderTenant(code): HeaderTenant,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    state.store.delete::<CalendarEvent>(&code, id)?;
    Ok(deleted())
}
