use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use time::OffsetDateTime;
use tracing::debug;

use crate::{auth::cookie::cookie_value, error::AppError, state::AppState};

/// Email of the signed-in user, placed in the request extensions by
/// [`require_session`]. Lives only as long as the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

/// Session token from the cookie, falling back to `Authorization: Bearer`.
pub fn token_from_headers<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    cookie_value(headers, cookie_name).or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
            .map(str::trim)
            .filter(|t| !t.is_empty())
    })
}

/// Gate for the protected route group. Any missing or invalid token sends the
/// browser to `/login`.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = token_from_headers(request.headers(), &state.config.cookie.name)
        .ok_or_else(|| {
            debug!(path = %request.uri().path(), "no session token");
            AppError::Unauthenticated
        })?;

    let claims = state
        .tokens
        .verify(token, OffsetDateTime::now_utc())
        .map_err(|e| {
            debug!(error = %e, "session token rejected");
            AppError::from(e)
        })?;

    request.extensions_mut().insert(CurrentUser(claims.identity));
    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AppError::Unauthenticated)
    }
}
