//! Server-rendered pages. Every interpolated value goes through [`escape`].

use axum::response::Html;
use uuid::Uuid;

use crate::todos::repo::Todo;

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} · Todo</title>
<link rel="stylesheet" href="/static/style.css">
</head>
<body>
{body}
</body>
</html>"#,
        title = escape(title),
    ))
}

fn error_block(error: Option<&str>) -> String {
    match error {
        Some(e) if !e.is_empty() => format!(r#"<p class="error">{}</p>"#, escape(e)),
        _ => String::new(),
    }
}

pub fn register_page(error: Option<&str>) -> Html<String> {
    layout(
        "Register",
        &format!(
            r#"<h1>Register</h1>
{error}
<form method="post" action="/register">
  <label>Email <input type="email" name="email" required></label>
  <label>Password <input type="password" name="password" minlength="6" required></label>
  <button type="submit">Register</button>
</form>
<p>Already have an account? <a href="/login">Log in</a></p>"#,
            error = error_block(error),
        ),
    )
}

pub fn login_page(error: Option<&str>) -> Html<String> {
    layout(
        "Login",
        &format!(
            r#"<h1>Login</h1>
{error}
<form method="post" action="/login">
  <label>Email <input type="email" name="email" required></label>
  <label>Password <input type="password" name="password" required></label>
  <button type="submit">Log in</button>
</form>
<p>No account yet? <a href="/register">Register</a></p>"#,
            error = error_block(error),
        ),
    )
}

pub fn lists_page(email: &str, todos: &[Todo]) -> Html<String> {
    let rows: String = if todos.is_empty() {
        "<li>Nothing to do.</li>".to_string()
    } else {
        todos
            .iter()
            .map(|t| {
                format!(
                    r#"<li class="{class}"><strong>{title}</strong> {content}
  <a href="/lists/edit/{id}">Edit</a>
  <form method="post" action="/lists/delete/{id}" style="display:inline"><button type="submit">Delete</button></form>
</li>"#,
                    class = if t.done { "done" } else { "open" },
                    title = escape(&t.title),
                    content = escape(&t.content),
                    id = t.id,
                )
            })
            .collect()
    };
    layout(
        "Your todos",
        &format!(
            r#"<header>Signed in as {email} · <a href="/logout">Log out</a></header>
<h1>Your todos</h1>
<p><a href="/lists/create">New todo</a></p>
<ul>
{rows}
</ul>"#,
            email = escape(email),
        ),
    )
}

pub fn create_page(error: Option<&str>) -> Html<String> {
    layout(
        "New todo",
        &format!(
            r#"<h1>New todo</h1>
{error}
<form method="post" action="/lists/create">
  <label>Title <input type="text" name="title" required></label>
  <label>Content <textarea name="content"></textarea></label>
  <button type="submit">Create</button>
</form>
<p><a href="/lists">Back</a></p>"#,
            error = error_block(error),
        ),
    )
}

pub fn edit_page(todo: &Todo) -> Html<String> {
    edit_form(todo.id, &todo.title, &todo.content, todo.done)
}

fn edit_form(id: Uuid, title: &str, content: &str, done: bool) -> Html<String> {
    layout(
        "Edit todo",
        &format!(
            r#"<h1>Edit todo</h1>
<form method="post" action="/lists/edit/{id}">
  <label>Title <input type="text" name="title" value="{title}" required></label>
  <label>Content <textarea name="content">{content}</textarea></label>
  <label><input type="checkbox" name="done"{checked}> Done</label>
  <button type="submit">Save</button>
</form>
<p><a href="/lists">Back</a></p>"#,
            title = escape(title),
            content = escape(content),
            checked = if done { " checked" } else { "" },
        ),
    )
}

pub fn error_page() -> Html<String> {
    layout(
        "Error",
        r#"<h1>Something went wrong</h1>
<p>Please try again later. <a href="/lists">Back to your todos</a></p>"#,
    )
}
