use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::CurrentUser,
    error::AppError,
    state::AppState,
    todos::{
        dto::{CreateTodoForm, UpdateTodoForm},
        repo::{Todo, TodoChanges},
    },
    views,
};

pub fn todo_routes() -> Router<AppState> {
    Router::new()
        .route("/lists", get(list_todos))
        .route("/lists/create", get(create_page).post(create_todo))
        .route("/lists/edit/:id", get(edit_page).post(update_todo))
        .route("/lists/delete/:id", post(delete_todo))
}

fn todo_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, AppError> {
    path.map(|Path(id)| id)
        .map_err(|_| AppError::BadRequest("Invalid ID".into()))
}

#[instrument(skip(state))]
pub async fn list_todos(
    State(state): State<AppState>,
    CurrentUser(email): CurrentUser,
) -> Result<Html<String>, AppError> {
    let todos = state.todos.list_by_owner(&email).await?;
    Ok(views::lists_page(&email, &todos))
}

pub async fn create_page() -> Html<String> {
    views::create_page(None)
}

#[instrument(skip(state, form))]
pub async fn create_todo(
    State(state): State<AppState>,
    CurrentUser(email): CurrentUser,
    Form(form): Form<CreateTodoForm>,
) -> Result<Response, AppError> {
    let title = form.title.trim();
    if title.is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            views::create_page(Some("Title is required")),
        )
            .into_response());
    }

    let now = OffsetDateTime::now_utc();
    let todo = Todo {
        id: Uuid::new_v4(),
        user_email: email,
        title: title.to_string(),
        content: form.content,
        done: false,
        created_at: now,
        updated_at: now,
    };
    let id = state.todos.insert(&todo).await?;
    info!(todo_id = %id, "todo created");
    Ok(Redirect::to("/lists").into_response())
}

#[instrument(skip(state))]
pub async fn edit_page(
    State(state): State<AppState>,
    CurrentUser(email): CurrentUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Html<String>, AppError> {
    let id = todo_id(path)?;
    let todo = state
        .todos
        .get(&email, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Not found".into()))?;
    Ok(views::edit_page(&todo))
}

#[instrument(skip(state, form))]
pub async fn update_todo(
    State(state): State<AppState>,
    CurrentUser(email): CurrentUser,
    path: Result<Path<Uuid>, PathRejection>,
    Form(form): Form<UpdateTodoForm>,
) -> Result<Redirect, AppError> {
    let id = todo_id(path)?;
    let title = form.title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("Invalid input".into()));
    }

    let changes = TodoChanges {
        title: title.to_string(),
        content: form.content.clone(),
        done: form.is_done(),
    };
    if !state.todos.update(&email, id, &changes).await? {
        return Err(AppError::NotFound("Not found".into()));
    }
    info!(todo_id = %id, done = changes.done, "todo updated");
    Ok(Redirect::to("/lists"))
}

#[instrument(skip(state))]
pub async fn delete_todo(
    State(state): State<AppState>,
    CurrentUser(email): CurrentUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Redirect, AppError> {
    let id = todo_id(path)?;
    if !state.todos.delete(&email, id).await? {
        return Err(AppError::NotFound("Not found".into()));
    }
    info!(todo_id = %id, "todo deleted");
    Ok(Redirect::to("/lists"))
}
