//! The agent reasoning loop implementation.

use std::sync::Arc;

use calculus_config::AppConfig;
use calculus_core::event::{AgentEvent, EventBus};
use calculus_core::message::{Conversation, Message};
use calculus_core::provider::{Provider, ProviderRequest, ReasoningEffort, Usage};
use calculus_core::tool::{ToolCall, ToolRegistry, ToolResult};
use futures::future::join_all;
use tracing::{debug, info, warn};

/// What a completed turn produced.
#[derive(Debug, Clone)]
pub struct TurnSummary {
    /// The model's final text
    pub answer: String,

    /// Model calls made, including the one that answered
    pub rounds: u32,

    /// Tool calls dispatched across all rounds
    pub tool_calls_made: usize,

    /// Summed usage, if the backend reported any
    pub usage: Option<Usage>,
}

/// The core agent loop that orchestrates model calls and tool execution.
pub struct AgentLoop {
    /// The model backend
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    /// Temperature setting
    temperature: f32,

    /// Nucleus sampling, when set
    top_p: Option<f32>,

    /// Reasoning effort hint, when set
    reasoning_effort: Option<ReasoningEffort>,

    /// Max tokens per response
    max_tokens: Option<u32>,

    /// Tool registry
    tools: Arc<ToolRegistry>,

    /// Maximum model rounds per turn
    max_rounds: u32,

    /// Dispatch a round concurrently when all its tools allow it
    parallel_tool_calls: bool,

    /// Event bus for agent events
    event_bus: Arc<EventBus>,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.5,
            top_p: None,
            reasoning_effort: None,
            max_tokens: None,
            tools,
            max_rounds: 25,
            parallel_tool_calls: false,
            event_bus,
        }
    }

    /// Create an agent loop with every setting taken from configuration.
    pub fn from_config(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        event_bus: Arc<EventBus>,
        config: &AppConfig,
    ) -> Self {
        let mut agent = Self::new(provider, &config.model.name, tools, event_bus)
            .with_temperature(config.model.temperature)
            .with_max_rounds(config.agent.max_tool_rounds)
            .with_parallel_tool_calls(config.agent.parallel_tool_calls);
        agent.top_p = config.model.top_p;
        agent.reasoning_effort = config.model.reasoning_effort;
        agent.max_tokens = config.model.max_tokens;
        agent
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the maximum number of model rounds per turn.
    pub fn with_max_rounds(mut self, max: u32) -> Self {
        self.max_rounds = max;
        self
    }

    pub fn with_parallel_tool_calls(mut self, enabled: bool) -> Self {
        self.parallel_tool_calls = enabled;
        self
    }

    /// The event bus this loop publishes to.
    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// Drive the conversation until the model answers without tool calls.
    ///
    /// The caller appends the user message first. Every assistant message
    /// and tool result is appended as soon as it exists, so dropping this
    /// future leaves the conversation with everything recorded so far.
    pub async fn process(
        &self,
        conversation: &mut Conversation,
    ) -> Result<TurnSummary, calculus_core::Error> {
        info!(
            conversation_id = %conversation.id,
            messages = conversation.messages.len(),
            "Processing turn"
        );

        match self.run_rounds(conversation).await {
            Ok(summary) => {
                self.event_bus.publish(AgentEvent::Answer {
                    content: summary.answer.clone(),
                });
                self.event_bus.publish(AgentEvent::Done {
                    conversation_id: conversation.id.to_string(),
                    rounds: summary.rounds,
                    tool_calls_made: summary.tool_calls_made,
                    usage: summary.usage,
                });
                Ok(summary)
            }
            Err(e) => {
                warn!(conversation_id = %conversation.id, error = %e, "Turn aborted");
                self.event_bus.publish(AgentEvent::Error {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn run_rounds(
        &self,
        conversation: &mut Conversation,
    ) -> Result<TurnSummary, calculus_core::Error> {
        let tool_definitions = self.tools.definitions();
        let mut usage: Option<Usage> = None;
        let mut tool_calls_made = 0;

        for round in 1..=self.max_rounds {
            debug!(conversation_id = %conversation.id, round, "Agent loop round");

            let request = ProviderRequest {
                model: self.model.clone(),
                messages: conversation.messages.clone(),
                temperature: self.temperature,
                top_p: self.top_p,
                reasoning_effort: self.reasoning_effort,
                max_tokens: self.max_tokens,
                tools: tool_definitions.clone(),
            };

            let response = self.provider.complete(request).await?;

            if let Some(u) = &response.usage {
                usage.get_or_insert_with(Usage::default).add(u);
            }

            if response.message.tool_calls.is_empty() {
                let answer = response.message.content.clone();
                conversation.push(response.message);

                info!(
                    conversation_id = %conversation.id,
                    rounds = round,
                    tool_calls = tool_calls_made,
                    total_tokens = ?usage.map(|u| u.total_tokens),
                    "Turn complete"
                );

                return Ok(TurnSummary {
                    answer,
                    rounds: round,
                    tool_calls_made,
                    usage,
                });
            }

            let calls: Vec<ToolCall> = response
                .message
                .tool_calls
                .iter()
                .map(ToolCall::from_message)
                .collect();
            conversation.push(response.message);
            tool_calls_made += calls.len();

            debug!(tool_count = calls.len(), round, "Executing tool calls");
            self.dispatch_round(conversation, &calls, round).await;
        }

        Err(calculus_core::Error::ToolLoopExceeded {
            max_rounds: self.max_rounds,
        })
    }

    /// Dispatch one round of calls, appending results in the model's order.
    async fn dispatch_round(&self, conversation: &mut Conversation, calls: &[ToolCall], round: u32) {
        let concurrent =
            self.parallel_tool_calls && calls.len() > 1 && self.tools.all_parallel_safe(calls);

        if concurrent {
            for call in calls {
                self.announce(call, round);
            }
            let results = join_all(calls.iter().map(|call| self.tools.dispatch(call))).await;
            for result in results {
                self.record(conversation, result);
            }
        } else {
            for call in calls {
                self.announce(call, round);
                let result = self.tools.dispatch(call).await;
                self.record(conversation, result);
            }
        }
    }

    fn announce(&self, call: &ToolCall, round: u32) {
        self.event_bus.publish(AgentEvent::ToolCall {
            call_id: call.id.clone(),
            name: call.name.clone(),
            arguments: call.arguments.clone(),
            round,
        });
    }

    fn record(&self, conversation: &mut Conversation, result: ToolResult) {
        let content = result.to_content();
        let output = match &result.outcome {
            Ok(value) => value.clone(),
            Err(_) => serde_json::from_str(&content).unwrap_or(serde_json::Value::String(content.clone())),
        };

        self.event_bus.publish(AgentEvent::ToolResult {
            call_id: result.call_id.clone(),
            name: result.name.clone(),
            success: result.is_success(),
            output,
            duration_ms: result.duration.as_millis() as u64,
        });

        conversation.push(Message::tool_result(&result.call_id, content));
    }
}
