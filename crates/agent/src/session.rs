//! A single interactive session: one conversation, one todo list.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use calculus_core::event::EventBus;
use calculus_core::message::{Conversation, Message};
use calculus_core::todo::TodoStore;
use tracing::{info, warn};

use crate::loop_runner::{AgentLoop, TurnSummary};

/// How a turn ended.
#[derive(Debug)]
pub enum TurnOutcome {
    /// The model produced a final answer.
    Answered(TurnSummary),
    /// The user interrupted; `closed` pending tool calls were cancelled.
    Interrupted { closed: usize },
    /// The turn was aborted. The conversation is still usable.
    Failed(calculus_core::Error),
}

/// The built-in system prompt.
pub fn default_system_prompt(cwd: &Path) -> String {
    format!(
        "You are a helpful AI assistant\nYou live in my terminal at the cwd \"{}\"",
        cwd.display()
    )
}

pub struct Session {
    agent: AgentLoop,
    store: Arc<TodoStore>,
    system_prompt: String,
    conversation: Conversation,
}

impl Session {
    pub fn new(agent: AgentLoop, store: Arc<TodoStore>, system_prompt: impl Into<String>) -> Self {
        let system_prompt = system_prompt.into();
        Self {
            agent,
            store,
            conversation: Conversation::with_system(&system_prompt),
            system_prompt,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        self.agent.event_bus()
    }

    /// Start over: a fresh system-primed conversation and an empty todo list.
    pub async fn reset(&mut self) {
        self.conversation = Conversation::with_system(&self.system_prompt);
        self.store.clear().await;
        info!(conversation_id = %self.conversation.id, "Session reset");
    }

    /// Run one user turn to completion.
    pub async fn turn(&mut self, input: &str) -> Result<TurnSummary, calculus_core::Error> {
        self.conversation.push(Message::user(input));
        self.agent.process(&mut self.conversation).await
    }

    /// Run one user turn unless `interrupt` resolves first.
    ///
    /// On interrupt the in-flight model or tool call is dropped. Results
    /// already recorded stay; calls left without a result are closed with a
    /// `cancelled` error so the next request is well-formed.
    pub async fn turn_until<F>(&mut self, input: &str, interrupt: F) -> TurnOutcome
    where
        F: Future<Output = ()>,
    {
        self.conversation.push(Message::user(input));

        let finished = tokio::select! {
            result = self.agent.process(&mut self.conversation) => Some(result),
            () = interrupt => None,
        };

        match finished {
            Some(Ok(summary)) => TurnOutcome::Answered(summary),
            Some(Err(e)) => TurnOutcome::Failed(e),
            None => {
                let closed = self.conversation.close_pending_tool_calls("interrupted by user");
                warn!(closed, "Turn interrupted");
                TurnOutcome::Interrupted { closed }
            }
        }
    }
}
