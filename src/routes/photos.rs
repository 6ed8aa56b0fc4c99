use axum::body::Bytes;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::domain::photo::{NewPhoto, Photo, PhotoFilter};
use crate::error::{AppError, AppResult};
use crate::extractors::{linked_code, MaybeUser, Params, QueryTenant};
use crate::state::AppState;
use crate::tenant::TenantKey;
use crate::uploads;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/photos", get(list).post(upload))
        .route("/photos/file/{filename}", get(file))
}

#[derive(Deserialize)]
struct UploadQuery {
    code: Option<String>,
}

struct UploadForm {
    couple_code: Option<String>,
    activity_id: Option<i64>,
    blog_entry_id: Option<i64>,
    file: Option<(String, Bytes)>,
}

async fn read_form(mut multipart: Multipart) -> AppResult<UploadForm> {
    let mut form = UploadForm {
        couple_code: None,
        activity_id: None,
        blog_entry_id: None,
        file: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                form.file = Some((file_name, bytes));
            }
            "couple_code" | "activity_id" | "blog_entry_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                match name.as_str() {
                    "couple_code" => form.couple_code = Some(text),
                    "activity_id" => form.activity_id = parse_id(&name, &text)?,
                    _ => form.blog_entry_id = parse_id(&name, &text)?,
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

fn parse_id(field: &str, text: &str) -> AppResult<Option<i64>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse()
        .map(Some)
        .map_err(|_| AppError::BadRequest(format!("{} must be an integer", field)))
}

/// Couple code comes from `?code=`, then the form field, then the signed-in user.
async fn upload(
    State(state): State<AppState>,
    Params(query): Params<UploadQuery>,
    MaybeUser(user): MaybeUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<Photo>)> {
    let form = read_form(multipart).await?;

    let code = TenantKey::from_optional(query.code.as_deref())
        .or_else(|| TenantKey::from_optional(form.couple_code.as_deref()))
        .or_else(|| user.as_ref().and_then(linked_code))
        .ok_or_else(|| AppError::BadRequest("Couple code is required".into()))?;
    let (file_name, bytes) = form
        .file
        .ok_or_else(|| AppError::BadRequest("File is required".into()))?;

    let file_path = state.uploads.save_photo(&file_name, &bytes).await?;
    let created: Result<Photo, _> = state.store.create(
        &code,
        NewPhoto {
            file_path: file_path.clone(),
            activity_id: form.activity_id,
            blog_entry_id: form.blog_entry_id,
        },
    );
    match created {
        Ok(photo) => Ok((StatusCode::CREATED, Json(photo))),
        Err(e) => {
            state.uploads.discard(&file_path).await;
            Err(e.into())
        }
    }
}

async fn list(
    State(state): State<AppState>,
    QueryTenant(code): QueryTenant,
    Params(filter): Params<PhotoFilter>,
) -> AppResult<Json<Vec<Photo>>> {
    Ok(Json(state.store.list(&code, &filter.to_filters())?))
}

async fn file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> AppResult<Response> {
    let bytes = state.uploads.read_photo(&filename).await?;
    Ok((
        [(header::CONTENT_TYPE, uploads::content_type(&filename))],
        bytes,
    )
        .into_response())
}
