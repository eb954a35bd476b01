//! Handler errors and how they reach the browser.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use crate::{auth::errors::AuthError, views};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No usable session; the browser goes back to the login page.
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthenticated => Redirect::to("/login").into_response(),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            AppError::Internal(msg) => {
                // Details stay in the log.
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, views::error_page()).into_response()
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        if err.is_session_failure() {
            return AppError::Unauthenticated;
        }
        match err {
            AuthError::InvalidInput(msg) => AppError::BadRequest(msg),
            AuthError::EmailTaken => AppError::BadRequest("Email already registered".into()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{err:#}"))
    }
}
