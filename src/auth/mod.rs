use crate::state::AppState;
use axum::Router;

pub mod claims;
pub mod cookie;
mod dto;
pub mod errors;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod repo;
pub mod services;

pub use middleware::{require_session, CurrentUser};

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
