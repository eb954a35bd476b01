use std::{future::Future, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::AppConfig;

/// Open the pool and make sure the database answers within the connect timeout.
pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let limit = config.db_connect_timeout();
    let db = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(limit)
        .connect(&config.database_url)
        .await
        .context("connect to database")?;

    timed(limit, "ping database", async {
        sqlx::query("SELECT 1").execute(&db).await?;
        Ok::<_, anyhow::Error>(())
    })
    .await?;

    tracing::info!("connected to database");
    Ok(db)
}

/// Run a store operation under a deadline. On timeout the future is dropped and
/// an error is returned; nothing is retried.
pub async fn timed<T, F>(limit: Duration, what: &'static str, fut: F) -> anyhow::Result<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res.context(what),
        Err(_) => {
            tracing::warn!(
                op = what,
                timeout_ms = limit.as_millis() as u64,
                "store operation timed out"
            );
            anyhow::bail!("{what}: timed out after {limit:?}")
        }
    }
}
