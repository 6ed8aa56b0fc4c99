use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::auth::TokenError;
use crate::store::{PatchError, StoreError};
use crate::tenant::TenantKeyError;
use crate::uploads::UploadError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Io(e) => {
                tracing::error!("I/O error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "detail": message }))).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(label) => AppError::NotFound(format!("{} not found", label)),
            StoreError::Conflict(msg) => AppError::Conflict(msg.to_string()),
            StoreError::Patch(e) => e.into(),
            StoreError::Database(e) => AppError::Pool(e),
            // Bad references (e.g. an activity_id that does not exist) are the caller's fault
            StoreError::Sql(rusqlite::Error::SqliteFailure(e, msg))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                tracing::warn!(
                    "Constraint violation: {}",
                    msg.as_deref().unwrap_or("no detail")
                );
                AppError::BadRequest("Invalid reference".to_string())
            }
            StoreError::Sql(e) => AppError::Database(e),
        }
    }
}

impl From<PatchError> for AppError {
    fn from(err: PatchError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<TenantKeyError> for AppError {
    fn from(err: TenantKeyError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Encode(e) => AppError::Internal(e.to_string()),
            other => AppError::Unauthorized(other.to_string()),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::InvalidName => AppError::BadRequest(err.to_string()),
            UploadError::NotFound => AppError::NotFound(err.to_string()),
            UploadError::Io(e) => AppError::Io(e),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    fn response_status(err: AppError) -> StatusCode {
        let response = err.into_response();
        response.status()
    }

    async fn response_detail(err: AppError) -> String {
        let body = to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        json["detail"].as_str().unwrap().to_string()
    }

    #[test]
    fn not_found_returns_404() {
        assert_eq!(
            response_status(AppError::NotFound("Book not found".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn unauthorized_returns_401() {
        assert_eq!(
            response_status(AppError::Unauthorized("Missing couple code".into())),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn bad_request_returns_400() {
        assert_eq!(
            response_status(AppError::BadRequest("oops".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn conflict_returns_409() {
        assert_eq!(
            response_status(AppError::Conflict("Email already registered".into())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn internal_returns_500() {
        assert_eq!(
            response_status(AppError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn store_errors_map_to_statuses() {
        assert_eq!(
            response_status(StoreError::NotFound("Goal").into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            response_status(StoreError::Patch(PatchError::NullField("title")).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            response_status(StoreError::Conflict("Email already registered").into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            response_status(StoreError::Sql(rusqlite::Error::QueryReturnedNoRows).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn body_carries_detail() {
        assert_eq!(
            response_detail(StoreError::NotFound("Goal").into()).await,
            "Goal not found"
        );
        assert_eq!(
            response_detail(PatchError::NullField("title").into()).await,
            "title cannot be null"
        );
    }

    #[tokio::test]
    async fn constraint_detail_is_not_leaked() {
        let violation = || -> AppError {
            StoreError::Sql(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: rusqlite::ErrorCode::ConstraintViolation,
                    extended_code: 787,
                },
                Some("FOREIGN KEY constraint failed".to_string()),
            ))
            .into()
        };
        assert_eq!(response_status(violation()), StatusCode::BAD_REQUEST);
        assert_eq!(response_detail(violation()).await, "Invalid reference");
    }

    #[tokio::test]
    async fn internal_detail_is_not_leaked() {
        assert_eq!(
            response_detail(AppError::Internal("secret path /var/db".into())).await,
            "Internal server error"
        );
    }
}
