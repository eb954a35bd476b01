mod app;
mod auth;
mod config;
mod db;
mod error;
mod state;
#[cfg(test)]
mod testing;
mod todos;
mod views;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenvy::dotenv().is_err() {
        eprintln!("no .env file found, relying on environment variables");
    }

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "todoapp=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let addr = config.bind_addr()?;
    let app_state = AppState::init(config).await?;

    let app = app::build_app(app_state);
    app::serve(app, addr).await
}
