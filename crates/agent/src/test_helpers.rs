//! Shared test helpers for agent tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use calculus_core::error::{ProviderError, ToolError};
use calculus_core::message::{Message, MessageToolCall};
use calculus_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use calculus_core::tool::{Tool, ToolRegistry};
use serde_json::{Value, json};

/// A mock provider that returns a sequence of scripted responses and
/// records every request it receives.
///
/// Panics if more calls are made than responses provided.
pub struct ScriptedProvider {
    responses: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self::scripted(responses.into_iter().map(Ok).collect())
    }

    pub fn scripted(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that returns a single text response (no tool calls).
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![text_response(text)])
    }

    /// A backend that is down.
    pub fn failing() -> Self {
        Self::scripted(vec![Err(ProviderError::Network("connection refused".into()))])
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            panic!("ScriptedProvider: no more responses (call #{call})");
        }
        responses.remove(0)
    }
}

fn usage() -> Option<Usage> {
    Some(Usage {
        prompt_tokens: 10,
        completion_tokens: 5,
        total_tokens: 15,
    })
}

/// Create a simple text response (no tool calls).
pub fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: usage(),
        model: "mock-model".into(),
    }
}

/// Create a response that only requests tool calls.
pub fn tool_call_response(tool_calls: Vec<MessageToolCall>) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant_with_tools("", tool_calls),
        usage: usage(),
        model: "mock-model".into(),
    }
}

pub fn tool_call(id: &str, name: &str, args: Value) -> MessageToolCall {
    MessageToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments: args.to_string(),
    }
}

pub fn registry_with(tools: Vec<Box<dyn Tool>>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for tool in tools {
        registry.register(tool).unwrap();
    }
    registry
}

/// Echoes `text` back as `{"echo": text}`.
pub struct Echo {
    name: String,
}

impl Echo {
    pub fn new(name: &str) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Tool for Echo {
    fn name(&self) -> &str {
        &self.name
    }
    fn description(&self) -> &str {
        "Echoes back the input"
    }
    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "text": { "type": "string" } },
            "required": ["text"]
        })
    }
    fn result_schema(&self) -> Value {
        json!({ "type": "object" })
    }
    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        Ok(json!({ "echo": arguments["text"] }))
    }
}

/// Always fails.
pub struct Failing;

#[async_trait]
impl Tool for Failing {
    fn name(&self) -> &str {
        "fail"
    }
    fn description(&self) -> &str {
        "Always fails"
    }
    fn parameters_schema(&self) -> Value {
        json!({ "type": "object" })
    }
    fn result_schema(&self) -> Value {
        json!({ "type": "object" })
    }
    async fn execute(&self, _arguments: Value) -> Result<Value, ToolError> {
        Err(ToolError::execution("fail", "service unavailable"))
    }
}

/// Sleeps for `ms` milliseconds, then reports it.
pub struct Sleepy;

#[async_trait]
impl Tool for Sleepy {
    fn name(&self) -> &str {
        "sleepy"
    }
    fn description(&self) -> &str {
        "Takes its time"
    }
    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "ms": { "type": "integer" } },
            "required": ["ms"]
        })
    }
    fn result_schema(&self) -> Value {
        json!({ "type": "object" })
    }
    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let ms = arguments["ms"].as_u64().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(json!({ "slept_ms": ms }))
    }
}
