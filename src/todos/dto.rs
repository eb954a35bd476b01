use serde::Deserialize;

/// Body of the create form.
#[derive(Debug, Deserialize)]
pub struct CreateTodoForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// Body of the edit form. An unchecked checkbox is simply absent.
#[derive(Debug, Deserialize)]
pub struct UpdateTodoForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub done: Option<String>,
}

impl UpdateTodoForm {
    pub fn is_done(&self) -> bool {
        self.done.as_deref() == Some("on")
    }
}
