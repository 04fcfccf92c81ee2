use chrono::Utc;
use shared::{
    domain::{TodoId, TodoItem},
    error::PipelineError,
};
use storage::TodoStore;
use tracing::info;

/// Todo list that writes itself back to its store after every mutation.
pub struct TodoList {
    todos: Vec<TodoItem>,
    store: TodoStore,
}

impl TodoList {
    /// Hydrates from `store`; anything unreadable starts an empty list.
    pub async fn load(store: TodoStore) -> Self {
        let todos = store.load().await;
        info!(count = todos.len(), "todos: loaded");
        Self { todos, store }
    }

    pub fn todos(&self) -> &[TodoItem] {
        &self.todos
    }

    pub fn get(&self, id: TodoId) -> Option<&TodoItem> {
        self.todos.iter().find(|todo| todo.id == id)
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.todos.iter().filter(|todo| !todo.completed).count()
    }

    /// Adds a todo at the top of the list.
    pub async fn add(&mut self, text: &str) -> Result<TodoId, PipelineError> {
        let text = non_blank(text)?;
        let id = self.next_id();
        self.todos.insert(0, TodoItem::new(id, text));
        self.persist().await;
        Ok(id)
    }

    /// Replaces the text of `id`. Returns whether the todo exists.
    pub async fn update(&mut self, id: TodoId, text: &str) -> Result<bool, PipelineError> {
        let text = non_blank(text)?;
        let Some(todo) = self.todos.iter_mut().find(|todo| todo.id == id) else {
            return Ok(false);
        };
        todo.text = text.to_string();
        self.persist().await;
        Ok(true)
    }

    pub async fn delete(&mut self, id: TodoId) -> bool {
        let before = self.todos.len();
        self.todos.retain(|todo| todo.id != id);
        if self.todos.len() == before {
            return false;
        }
        self.persist().await;
        true
    }

    pub async fn toggle_complete(&mut self, id: TodoId) -> bool {
        let Some(todo) = self.todos.iter_mut().find(|todo| todo.id == id) else {
            return false;
        };
        todo.completed = !todo.completed;
        self.persist().await;
        true
    }

    async fn persist(&self) {
        self.store.save(&self.todos).await;
    }

    /// Creation time in milliseconds, bumped past existing ids.
    fn next_id(&self) -> TodoId {
        let now = Utc::now().timestamp_millis();
        let after_latest = self
            .todos
            .iter()
            .map(|todo| todo.id.0.saturating_add(1))
            .max()
            .unwrap_or(i64::MIN);
        TodoId(now.max(after_latest))
    }
}

fn non_blank(text: &str) -> Result<&str, PipelineError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(PipelineError::invalid_input("text", "must not be empty"));
    }
    Ok(text)
}

#[cfg(test)]
#[path = "tests/todos_tests.rs"]
mod tests;
