use std::sync::Arc;

use anyhow::{Context, Result};
use shared::domain::TodoItem;
use tracing::{debug, warn};

use crate::KeyValueStore;

pub const TODOS_KEY: &str = "todos";

/// Loads and saves the todo list as one JSON array under a single key.
#[derive(Clone)]
pub struct TodoStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl TodoStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, TODOS_KEY)
    }

    pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Best effort: missing, unreadable or corrupt data yields an empty list.
    pub async fn load(&self) -> Vec<TodoItem> {
        match self.try_load().await {
            Ok(Some(todos)) => todos,
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(key = %self.key, "todos: discarding unreadable saved list: {err:#}");
                Vec::new()
            }
        }
    }

    pub async fn try_load(&self) -> Result<Option<Vec<TodoItem>>> {
        let Some(raw) = self.store.get(&self.key).await? else {
            return Ok(None);
        };
        let todos = serde_json::from_str::<Option<Vec<TodoItem>>>(&raw)
            .with_context(|| format!("stored value under '{}' is not a todo list", self.key))?;
        Ok(todos)
    }

    /// Fire-and-forget: a failed write is logged and otherwise ignored.
    pub async fn save(&self, todos: &[TodoItem]) {
        if let Err(err) = self.try_save(todos).await {
            warn!(key = %self.key, count = todos.len(), "todos: save failed: {err:#}");
        }
    }

    pub async fn try_save(&self, todos: &[TodoItem]) -> Result<()> {
        let serialized = serde_json::to_string(todos)?;
        self.store.set(&self.key, &serialized).await?;
        debug!(key = %self.key, count = todos.len(), "todos: saved");
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/todos_tests.rs"]
mod tests;
