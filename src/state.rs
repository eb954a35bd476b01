use std::sync::Arc;

use anyhow::Context;

use crate::{
    auth::{
        jwt::{JwtKeys, TokenCodec},
        password::PasswordHasher,
        repo::{CredentialStore, PgCredentialStore},
        services::Authenticator,
    },
    config::AppConfig,
    db,
    todos::repo::{PgTodoStore, TodoStore},
};

/// Everything a request needs, built once at startup and read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub authenticator: Authenticator,
    pub tokens: Arc<dyn TokenCodec>,
    pub todos: Arc<dyn TodoStore>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let pool = db::connect(&config).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("run migrations")?;
        tracing::info!("migrations applied");

        let users = Arc::new(PgCredentialStore::new(pool.clone(), config.db_timeout()));
        let todos = Arc::new(PgTodoStore::new(pool, config.db_timeout()));
        let tokens = Arc::new(JwtKeys::new(&config.jwt)?);
        let hasher = PasswordHasher::new(&config.password)?;

        Ok(Self::from_parts(config, users, todos, tokens, hasher))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn CredentialStore>,
        todos: Arc<dyn TodoStore>,
        tokens: Arc<dyn TokenCodec>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            config,
            authenticator: Authenticator::new(users, hasher),
            tokens,
            todos,
        }
    }
}
