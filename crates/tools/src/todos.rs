//! Todos tool: lets the model plan work and report progress.
//!
//! Every call replaces the whole batch held by the injected [`TodoStore`].

use std::sync::Arc;

use async_trait::async_trait;
use calculus_core::error::ToolError;
use calculus_core::todo::{Todo, TodoInput, TodoStore};
use calculus_core::tool::{Tool, parse_arguments, to_result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct TodosArgs {
    todos: Vec<TodoInput>,
}

#[derive(Debug, Serialize)]
struct TodosOutput {
    todos: Vec<Todo>,
}

pub struct TodosTool {
    store: Arc<TodoStore>,
}

impl TodosTool {
    pub fn new(store: Arc<TodoStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for TodosTool {
    fn name(&self) -> &str {
        "todos"
    }

    fn description(&self) -> &str {
        "Manage task planning and progress tracking.\n\
         Use for breaking down complex work and tracking progress.\n\
         Create new: omit 'id' (auto-generated). Update existing: include the 'id' from the previous response.\n\
         Status flow: pending -> in_progress -> completed. The list auto-clears when all items are completed.\n\
         The UI displays todos automatically, don't repeat them in your answer."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "todos": {
                    "type": "array",
                    "description": "The entire batch. It replaces the current list, so include every todo you want to keep",
                    "items": {
                        "type": "object",
                        "properties": {
                            "content": {
                                "type": "string",
                                "description": "Specific, actionable task description"
                            },
                            "status": {
                                "type": "string",
                                "enum": ["pending", "in_progress", "completed"]
                            },
                            "id": {
                                "type": ["string", "null"],
                                "description": "Identifier of an existing todo. Omit or null for new todos"
                            }
                        },
                        "required": ["content", "status"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["todos"],
            "additionalProperties": false
        })
    }

    fn result_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "todos": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "content": { "type": "string" },
                            "status": {
                                "type": "string",
                                "enum": ["pending", "in_progress", "completed"]
                            }
                        },
                        "required": ["id", "content", "status"]
                    }
                }
            },
            "required": ["todos"]
        })
    }

    fn parallel_safe(&self) -> bool {
        false
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: TodosArgs = parse_arguments(self.name(), arguments)?;
        let written = self.store.write_todos(args.todos).await;
        to_result(self.name(), &TodosOutput { todos: written.todos })
    }
}
