use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::password;
use crate::domain::user::{self, ProfilePatch, Registration, User};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, JsonBody};
use crate::state::AppState;
use crate::uploads;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/register", post(register))
        .route("/user/login", post(login))
        .route("/user/profile", get(profile).put(update_profile))
        .route("/user/profile/picture", post(upload_picture))
        .route("/user/profile/picture/{filename}", get(picture))
}

/// OAuth2 password-flow form; `username` carries the email.
#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    access_token: String,
    token_type: &'static str,
    user: User,
}

async fn register(
    State(state): State<AppState>,
    JsonBody(registration): JsonBody<Registration>,
) -> AppResult<(StatusCode, Json<User>)> {
    if registration.email.trim().is_empty() || registration.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".into(),
        ));
    }

    let cost = state.config.auth.bcrypt_cost;
    let plain = registration.password.clone();
    let hash = tokio::task::spawn_blocking(move || password::hash(&plain, cost))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let user = user::create(&state.db, &registration, hash)?;
    tracing::info!("Registered user {}", user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Json<LoginResponse>> {
    let invalid = || AppError::Unauthorized("Incorrect email or password".into());

    let user = user::find_by_email(&state.db, &form.username)?.ok_or_else(invalid)?;

    let stored = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || password::verify(&form.password, &stored))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !matches {
        return Err(invalid());
    }

    let access_token = state.tokens.issue(user.id)?;
    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer",
        user,
    }))
}

async fn profile(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(patch): JsonBody<ProfilePatch>,
) -> AppResult<Json<User>> {
    Ok(Json(user::update_profile(&state.db, user.id, patch)?))
}

async fn upload_picture(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> AppResult<Json<User>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let path = state
            .uploads
            .save_profile_picture(user.id, &file_name, &bytes)
            .await?;
        return match user::set_profile_pic(&state.db, user.id, &path) {
            Ok(user) => Ok(Json(user)),
            Err(e) => {
                state.uploads.discard(&path).await;
                Err(e.into())
            }
        };
    }

    Err(AppError::BadRequest("File is required".into()))
}

async fn picture(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> AppResult<Response> {
    let bytes = state.uploads.read_profile_picture(&filename).await?;
    Ok((
        [(header::CONTENT_TYPE, uploads::content_type(&filename))],
        bytes,
    )
        .into_response())
}
