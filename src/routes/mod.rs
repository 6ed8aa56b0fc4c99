pub mod activities;
pub mod blog;
pub mod books;
pub mod calendar;
pub mod challenges;
pub mod goals;
pub mod movies;
pub mod photos;
pub mod user;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The full application, ready to serve.
pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/", get(index))
        .merge(activities::router())
        .merge(books::router())
        .merge(movies::router())
        .merge(blog::router())
        .merge(photos::router())
        .merge(calendar::router())
        .merge(challenges::router())
        .merge(goals::router())
        .merge(user::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(state.config.max_upload_bytes())),
        );

    if state.config.server.cors {
        app = app.layer(CorsLayer::permissive());
    }

    app.with_state(state)
}

async fn index() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Twogether API" }))
}

/// Body of a successful delete.
pub fn deleted() -> Json<Value> {
    Json(json!({ "status": "success" }))
}

/// `?partner_id=` on create endpoints, recorded as `created_by`.
#[derive(Debug, Default, Deserialize)]
pub struct PartnerQuery {
    pub partner_id: Option<String>,
}
