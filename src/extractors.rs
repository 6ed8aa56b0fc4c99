use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::header;
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::domain::user::{self, User};
use crate::error::AppError;
use crate::state::AppState;
use crate::store::StoreError;
use crate::tenant::TenantKey;

pub const COUPLE_CODE_HEADER: &str = "x-couple-code";

/// The user behind a valid bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Extractor that requires a bearer token.
/// Returns 401 if the token is missing, invalid, expired, or names a deleted user.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Not authenticated".into()))?;

        let claims = state.tokens.verify(token)?;
        let id = claims
            .user_id()
            .ok_or_else(|| AppError::Unauthorized("Could not validate credentials".into()))?;

        match user::get(&state.db, id) {
            Ok(user) => Ok(CurrentUser(user)),
            Err(StoreError::NotFound(_)) => Err(AppError::Unauthorized(
                "Could not validate credentials".into(),
            )),
            Err(e) => Err(e.into()),
        }
    }
}

/// Optional user extractor. Returns None instead of 401 when not authenticated.
pub struct MaybeUser(pub Option<User>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if bearer_token(parts).is_none() {
            return Ok(MaybeUser(None));
        }
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(CurrentUser(user)) => Ok(MaybeUser(Some(user))),
            Err(AppError::Unauthorized(_)) => Ok(MaybeUser(None)),
            Err(e) => Err(e),
        }
    }
}

/// Couple code from `?code=`, falling back to the signed-in user's linked code.
/// Missing → 400.
#[derive(Debug, Clone)]
pub struct QueryTenant(pub TenantKey);

/// Couple code from the `X-Couple-Code` header, falling back to the signed-in
/// user's linked code. Missing → 401.
#[derive(Debug, Clone)]
pub struct HeaderTenant(pub TenantKey);

#[derive(Deserialize)]
struct CodeQuery {
    code: Option<String>,
}

impl FromRequestParts<AppState> for QueryTenant {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let code = Query::<CodeQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(q)| q.code);
        if let Some(key) = TenantKey::from_optional(code.as_deref()) {
            return Ok(QueryTenant(key));
        }

        linked_tenant(parts, state)
            .await?
            .map(QueryTenant)
            .ok_or_else(|| AppError::BadRequest("Couple code is required".into()))
    }
}

impl FromRequestParts<AppState> for HeaderTenant {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let code = parts
            .headers
            .get(COUPLE_CODE_HEADER)
            .and_then(|v| v.to_str().ok());
        if let Some(key) = TenantKey::from_optional(code) {
            return Ok(HeaderTenant(key));
        }

        linked_tenant(parts, state)
            .await?
            .map(HeaderTenant)
            .ok_or_else(|| AppError::Unauthorized("Missing couple code".into()))
    }
}

/// The couple code linked to the bearer token's user, if any.
async fn linked_tenant(parts: &mut Parts, state: &AppState) -> Result<Option<TenantKey>, AppError> {
    let MaybeUser(user) = MaybeUser::from_request_parts(parts, state).await?;
    Ok(user.as_ref().and_then(linked_code))
}

/// The couple code a user has linked to their account, if any.
pub fn linked_code(user: &User) -> Option<TenantKey> {
    TenantKey::from_optional(user.couple_code.as_deref())
}

/// `Json<T>` whose rejections use the JSON error body.
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        Ok(JsonBody(value))
    }
}

/// `Query<T>` whose rejections use the JSON error body.
pub struct Params<T>(pub T);

impl<T, S> FromRequestParts<S> for Params<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::try_from_uri(&parts.uri)
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        Ok(Params(value))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn bearer_token_requires_scheme() {
        let p = parts(Request::builder().header("Authorization", "Bearer abc.def"));
        assert_eq!(bearer_token(&p), Some("abc.def"));

        let p = parts(Request::builder().header("Authorization", "bearer abc"));
        assert_eq!(bearer_token(&p), Some("abc"));

        let p = parts(Request::builder().header("Authorization", "Basic abc"));
        assert_eq!(bearer_token(&p), None);

        let p = parts(Request::builder().header("Authorization", "Bearer "));
        assert_eq!(bearer_token(&p), None);

        let p = parts(Request::builder());
        assert_eq!(bearer_token(&p), None);
    }
}
