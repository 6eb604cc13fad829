//! Todo store: the task list the model maintains through the `todos` tool.
//!
//! The list is always written as a whole batch: every write replaces the
//! previous batch, and a batch whose items are all completed clears the
//! store right after being returned to the caller.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Progress of a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
}

/// One tracked task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub content: String,
    pub status: TodoStatus,
}

impl Todo {
    pub fn is_completed(&self) -> bool {
        self.status == TodoStatus::Completed
    }
}

/// A task as submitted by the caller. A missing or empty `id` creates a new
/// task; any other `id` is kept as-is.
#[derive(Debug, Clone, Deserialize)]
pub struct TodoInput {
    pub content: String,
    pub status: TodoStatus,
    #[serde(default)]
    pub id: Option<String>,
}

/// What a write produced.
#[derive(Debug, Clone)]
pub struct TodoWrite {
    /// The batch as written, before any auto-clear.
    pub todos: Vec<Todo>,

    /// Whether the store emptied itself because everything was completed.
    pub cleared: bool,
}

#[derive(Default)]
struct StoreState {
    batch: Vec<Todo>,
    issued: HashSet<String>,
}

impl StoreState {
    fn fresh_id(&mut self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if self.issued.insert(id.clone()) {
                return id;
            }
        }
    }
}

/// Owns the current batch. All access goes through atomic operations; the
/// lock is never handed out.
#[derive(Default)]
pub struct TodoStore {
    state: Mutex<StoreState>,
}

impl TodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole batch with `items`.
    ///
    /// Ids that repeat within the same write are regenerated so the batch
    /// never holds duplicates.
    pub async fn write_todos(&self, items: Vec<TodoInput>) -> TodoWrite {
        let mut state = self.state.lock().await;

        let mut seen = HashSet::new();
        let mut todos = Vec::with_capacity(items.len());
        for item in items {
            let id = match item.id.filter(|id| !id.is_empty()) {
                Some(id) if seen.insert(id.clone()) => {
                    state.issued.insert(id.clone());
                    id
                }
                _ => {
                    let id = state.fresh_id();
                    seen.insert(id.clone());
                    id
                }
            };
            todos.push(Todo {
                id,
                content: item.content,
                status: item.status,
            });
        }

        let cleared = !todos.is_empty() && todos.iter().all(Todo::is_completed);
        state.batch = if cleared { Vec::new() } else { todos.clone() };

        debug!(count = todos.len(), cleared, "Todo batch replaced");
        TodoWrite { todos, cleared }
    }

    /// A copy of the current batch.
    pub async fn snapshot(&self) -> Vec<Todo> {
        self.state.lock().await.batch.clone()
    }

    /// Drop every task.
    pub async fn clear(&self) {
        self.state.lock().await.batch.clear();
    }
}
