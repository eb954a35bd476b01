use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::timed;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                   // unique user ID
    pub email: String,              // stored as entered, matched exactly
    #[serde(skip_serializing)]
    pub password_hash: String,      // Argon2 digest, never exposed
    pub created_at: OffsetDateTime, // creation timestamp
}

/// Where user records live.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn insert(&self, user: &User) -> anyhow::Result<Uuid>;
}

#[derive(Clone)]
pub struct PgCredentialStore {
    db: PgPool,
    timeout: Duration,
}

impl PgCredentialStore {
    pub fn new(db: PgPool, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        timed(self.timeout, "find user by email", async {
            let user = sqlx::query_as::<_, User>(
                r#"
                SELECT id, email, password_hash, created_at
                FROM users
                WHERE email = $1
                "#,
            )
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
            Ok(user)
        })
        .await
    }

    async fn insert(&self, user: &User) -> anyhow::Result<Uuid> {
        timed(self.timeout, "insert user", async {
            let (id,) = sqlx::query_as::<_, (Uuid,)>(
                r#"
                INSERT INTO users (id, email, password_hash, created_at)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.created_at)
            .fetch_one(&self.db)
            .await?;
            Ok(id)
        })
        .await
    }
}
