use axum::{
    extract::{rejection::FormRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        cookie::session_cookie,
        dto::{LoginPayload, RegisterForm},
        errors::AuthError,
        jwt::IssuedToken,
        middleware::token_from_headers,
    },
    error::AppError,
    state::AppState,
    views,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_page).post(register))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
        .route("/refresh", post(refresh))
}

pub async fn register_page() -> Html<String> {
    views::register_page(None)
}

pub async fn login_page() -> Html<String> {
    views::login_page(None)
}

#[instrument(skip(state, form))]
pub async fn register(
    State(state): State<AppState>,
    form: Result<Form<RegisterForm>, FormRejection>,
) -> Response {
    let Ok(Form(form)) = form else {
        warn!("register form rejected");
        return (
            StatusCode::BAD_REQUEST,
            views::register_page(Some("Invalid input")),
        )
            .into_response();
    };

    match state.authenticator.register(&form.email, &form.password).await {
        Ok(_) => Redirect::to("/login").into_response(),
        Err(AuthError::InvalidInput(msg)) => (
            StatusCode::BAD_REQUEST,
            views::register_page(Some(&format!("Invalid input: {msg}"))),
        )
            .into_response(),
        Err(AuthError::EmailTaken) => (
            StatusCode::BAD_REQUEST,
            views::register_page(Some("Email already registered")),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "registration failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                views::register_page(Some("Server error")),
            )
                .into_response()
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    LoginPayload(payload): LoginPayload,
) -> Result<Response, AppError> {
    let claim = state
        .authenticator
        .authenticate(&payload.email, &payload.password)
        .await?;

    let now = OffsetDateTime::now_utc();
    let issued = state.tokens.issue(&claim.email, now)?;
    info!(email = %claim.email, "user logged in");
    Ok(with_session_cookie(&state, &issued, now, "/lists"))
}

#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> Response {
    let cookie = session_cookie(&state.config.cookie.name, "", -1, state.config.cookie.secure);
    ([(header::SET_COOKIE, cookie)], Redirect::to("/login")).into_response()
}

/// Re-issue the session token while inside the refresh window.
#[instrument(skip(state, headers))]
pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    let token = token_from_headers(&headers, &state.config.cookie.name)
        .ok_or(AppError::Unauthenticated)?;
    let now = OffsetDateTime::now_utc();
    let issued = state.tokens.refresh(token, now).map_err(|e| {
        warn!(error = %e, "token refresh refused");
        AppError::from(e)
    })?;
    Ok(with_session_cookie(&state, &issued, now, "/lists"))
}

fn with_session_cookie(state: &AppState, issued: &IssuedToken, now: OffsetDateTime, to: &str) -> Response {
    let cookie = session_cookie(
        &state.config.cookie.name,
        &issued.token,
        issued.max_age(now),
        state.config.cookie.secure,
    );
    ([(header::SET_COOKIE, cookie)], Redirect::to(to)).into_response()
}
