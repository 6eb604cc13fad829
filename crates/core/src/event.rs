//! Agent events: what happened during a turn, in the order it happened.
//!
//! The agent loop publishes events; the terminal renderer subscribes and
//! turns them into trace lines. Neither side knows about the other.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::provider::Usage;

/// Events emitted by the agent loop while processing a turn.
///
/// - `tool_call`: a tool is about to be dispatched
/// - `tool_result`: a dispatched tool finished, successfully or not
/// - `answer`: the model's final text for the turn
/// - `done`: the turn is complete
/// - `error`: the turn was aborted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    ToolCall {
        call_id: String,
        name: String,
        arguments: serde_json::Value,
        round: u32,
    },

    ToolResult {
        call_id: String,
        name: String,
        success: bool,
        /// The result value, or the error payload on failure.
        output: serde_json::Value,
        duration_ms: u64,
    },

    Answer { content: String },

    Done {
        conversation_id: String,
        rounds: u32,
        tool_calls_made: usize,
        usage: Option<Usage>,
    },

    Error { message: String },
}

impl AgentEvent {
    /// Short name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Answer { .. } => "answer",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }
}

/// A broadcast-based event bus for agent events.
///
/// Uses `tokio::sync::broadcast` so any number of observers (the renderer,
/// tests) can follow a turn.
pub struct EventBus {
    sender: broadcast::Sender<Arc<AgentEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: AgentEvent) {
        // No subscribers is fine.
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<AgentEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
