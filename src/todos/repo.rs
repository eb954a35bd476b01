use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::timed;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Todo {
    pub id: Uuid,
    pub user_email: String,
    pub title: String,
    pub content: String,
    pub done: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields a user may change on an existing todo.
#[derive(Debug, Clone)]
pub struct TodoChanges {
    pub title: String,
    pub content: String,
    pub done: bool,
}

/// Todo persistence. Every lookup by id is also scoped to the owner, so a user
/// never sees another user's items.
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn list_by_owner(&self, owner: &str) -> anyhow::Result<Vec<Todo>>;
    async fn insert(&self, todo: &Todo) -> anyhow::Result<Uuid>;
    async fn get(&self, owner: &str, id: Uuid) -> anyhow::Result<Option<Todo>>;
    /// Returns false when no todo matched.
    async fn update(&self, owner: &str, id: Uuid, changes: &TodoChanges) -> anyhow::Result<bool>;
    /// Returns false when no todo matched.
    async fn delete(&self, owner: &str, id: Uuid) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgTodoStore {
    db: PgPool,
    timeout: Duration,
}

impl PgTodoStore {
    pub fn new(db: PgPool, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

#[async_trait]
impl TodoStore for PgTodoStore {
    async fn list_by_owner(&self, owner: &str) -> anyhow::Result<Vec<Todo>> {
        timed(self.timeout, "list todos", async {
            let rows = sqlx::query_as::<_, Todo>(
                r#"
                SELECT id, user_email, title, content, done, created_at, updated_at
                FROM todos
                WHERE user_email = $1
                ORDER BY created_at DESC
                "#,
            )
            .bind(owner)
            .fetch_all(&self.db)
            .await?;
            Ok(rows)
        })
        .await
    }

    async fn insert(&self, todo: &Todo) -> anyhow::Result<Uuid> {
        timed(self.timeout, "insert todo", async {
            let (id,) = sqlx::query_as::<_, (Uuid,)>(
                r#"
                INSERT INTO todos (id, user_email, title, content, done, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id
                "#,
            )
            .bind(todo.id)
            .bind(&todo.user_email)
            .bind(&todo.title)
            .bind(&todo.content)
            .bind(todo.done)
            .bind(todo.created_at)
            .bind(todo.updated_at)
            .fetch_one(&self.db)
            .await?;
            Ok(id)
        })
        .await
    }

    async fn get(&self, owner: &str, id: Uuid) -> anyhow::Result<Option<Todo>> {
        timed(self.timeout, "get todo", async {
            let todo = sqlx::query_as::<_, Todo>(
                r#"
                SELECT id, user_email, title, content, done, created_at, updated_at
                FROM todos
                WHERE id = $1 AND user_email = $2
                "#,
            )
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.db)
            .await?;
            Ok(todo)
        })
        .await
    }

    async fn update(&self, owner: &str, id: Uuid, changes: &TodoChanges) -> anyhow::Result<bool> {
        timed(self.timeout, "update todo", async {
            let res = sqlx::query(
                r#"
                UPDATE todos
                SET title = $3, content = $4, done = $5, updated_at = $6
                WHERE id = $1 AND user_email = $2
                "#,
            )
            .bind(id)
            .bind(owner)
            .bind(&changes.title)
            .bind(&changes.content)
            .bind(changes.done)
            .bind(OffsetDateTime::now_utc())
            .execute(&self.db)
            .await?;
            Ok(res.rows_affected() > 0)
        })
        .await
    }

    async fn delete(&self, owner: &str, id: Uuid) -> anyhow::Result<bool> {
        timed(self.timeout, "delete todo", async {
            let res = sqlx::query("DELETE FROM todos WHERE id = $1 AND user_email = $2")
                .bind(id)
                .bind(owner)
                .execute(&self.db)
                .await?;
            Ok(res.rows_affected() > 0)
        })
        .await
    }
}
