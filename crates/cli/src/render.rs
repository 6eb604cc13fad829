//! Turn renderer: agent events in, terminal lines out.

use calculus_core::event::AgentEvent;
use calculus_core::todo::Todo;
use serde_json::Value;
use tracing::warn;

use crate::ui::{GREEN, GREY, RED, RESET};

const PREVIEW_CHARS: usize = 80;

/// Trim, keep the first line, and cut it at `max` characters.
pub fn truncate_for_display(text: &str, max: usize) -> String {
    let first = text.trim().lines().next().unwrap_or_default();
    if first.chars().count() > max {
        let cut: String = first.chars().take(max).collect();
        format!("{cut}...")
    } else {
        first.to_string()
    }
}

fn preview(text: &str) -> String {
    truncate_for_display(text, PREVIEW_CHARS)
}

/// The argument worth showing next to a tool name.
fn salient_arguments(name: &str, arguments: &Value) -> String {
    let field = |key: &str| arguments.get(key).and_then(Value::as_str).map(str::to_string);
    let summary = match name {
        "clock" => field("format"),
        "fetch" => field("url"),
        "search" => field("query").map(|q| match field("engine") {
            Some(engine) => format!("{q} ({engine})"),
            None => q,
        }),
        "todos" => arguments
            .get("todos")
            .and_then(Value::as_array)
            .map(|items| format!("{} items", items.len())),
        _ => None,
    };
    preview(&summary.unwrap_or_else(|| arguments.to_string()))
}

fn checkbox(todo: &Todo) -> &'static str {
    if todo.is_completed() { "■" } else { "□" }
}

fn todo_lines(output: &Value) -> Result<Vec<String>, serde_json::Error> {
    let todos: Vec<Todo> = serde_json::from_value(output["todos"].clone())?;
    Ok(todos
        .iter()
        .map(|t| format!("  ⎿ {} {}", checkbox(t), preview(&t.content)))
        .collect())
}

fn success_lines(name: &str, output: &Value) -> Vec<String> {
    if name == "todos" {
        return match todo_lines(output) {
            Ok(lines) => lines,
            Err(e) => {
                warn!(error = %e, "Could not render todo list");
                vec![format!("  ⎿ {}", preview(&output.to_string()))]
            }
        };
    }

    let text = ["datetime", "results", "content"]
        .iter()
        .find_map(|key| output.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| output.to_string());
    vec![format!("  ⎿ {GREY}{}{RESET}", preview(&text))]
}

fn error_line(output: &Value) -> String {
    let error = &output["error"];
    let kind = error["kind"].as_str().unwrap_or("error");
    let message = error["message"].as_str().map(str::to_string).unwrap_or_else(|| output.to_string());
    format!("  ⎿ {RED}✗ {kind}: {}{RESET}", preview(&message))
}

/// Lines to print for one event. `Done` prints nothing.
pub fn render(event: &AgentEvent) -> Vec<String> {
    match event {
        AgentEvent::ToolCall { name, arguments, .. } => {
            vec![format!("{GREEN}●{RESET} {name}({})", salient_arguments(name, arguments))]
        }
        AgentEvent::ToolResult {
            name,
            success,
            output,
            ..
        } => {
            if *success {
                success_lines(name, output)
            } else {
                vec![error_line(output)]
            }
        }
        AgentEvent::Answer { content } => {
            vec![String::new(), format!("{GREEN}✔{RESET} Assistant: {}", content.trim()), String::new()]
        }
        AgentEvent::Done { .. } => Vec::new(),
        AgentEvent::Error { message } => vec![format!("{RED}✗ Error:{RESET} {message}")],
    }
}
