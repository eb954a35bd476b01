use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::header,
    Form, Json,
};
use serde::Deserialize;

use crate::error::AppError;

/// Registration form body.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login body, accepted as a urlencoded form or as JSON.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Extractor picking JSON or form decoding from the `Content-Type`.
/// Undecodable bodies become an empty request, which the authenticator then
/// rejects as missing credentials.
pub struct LoginPayload(pub LoginRequest);

#[async_trait]
impl<S> FromRequest<S> for LoginPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("application/json"))
            .unwrap_or(false);

        let body = if is_json {
            Json::<LoginRequest>::from_request(req, state)
                .await
                .map(|Json(b)| b)
                .unwrap_or_default()
        } else {
            Form::<LoginRequest>::from_request(req, state)
                .await
                .map(|Form(b)| b)
                .unwrap_or_default()
        };
        Ok(LoginPayload(body))
    }
}
