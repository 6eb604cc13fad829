//! Tool trait and registry: the abstraction over agent capabilities.
//!
//! Each tool is its own type implementing [`Tool`], with typed arguments
//! parsed inside `execute`. The registry binds names to tools once, at
//! startup, and `dispatch` turns every way a call can go wrong into a
//! [`ToolResult`] the model can read. Nothing a tool does can take the agent
//! loop down.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ToolError;
use crate::message::MessageToolCall;
use crate::provider::ToolDefinition;
use crate::schema;

/// A request to execute a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the LLM's tool_call.id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    pub arguments: Value,
}

impl ToolCall {
    /// Decode a tool call as it appears in an assistant message.
    ///
    /// Providers send arguments as a JSON string. An empty string means "no
    /// arguments"; text that is not JSON is kept as a string value so schema
    /// validation reports it instead of silently dropping it.
    pub fn from_message(tc: &MessageToolCall) -> Self {
        let raw = tc.arguments.trim();
        let arguments = if raw.is_empty() {
            Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(tc.arguments.clone()))
        };
        Self {
            id: tc.id.clone(),
            name: tc.name.clone(),
            arguments,
        }
    }
}

/// The result of one dispatched tool call.
#[derive(Debug, Clone)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// The tool that was (or would have been) invoked
    pub name: String,

    /// The structured value on success, the failure otherwise
    pub outcome: Result<Value, ToolError>,

    /// Wall-clock time spent in dispatch
    pub duration: Duration,
}

impl ToolResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The JSON text recorded in the conversation for the model to read.
    pub fn to_content(&self) -> String {
        match &self.outcome {
            Ok(value) => value.to_string(),
            Err(err) => error_payload(err).to_string(),
        }
    }
}

fn error_payload(err: &ToolError) -> Value {
    let mut body = serde_json::json!({
        "kind": err.kind(),
        "message": err.to_string(),
    });
    if let ToolError::InvalidArguments { violations, .. } = err {
        body["violations"] = serde_json::json!(violations);
    }
    serde_json::json!({ "error": body })
}

/// The core Tool trait.
///
/// Tools are registered in the [`ToolRegistry`] and made available to the
/// agent loop. `execute` receives arguments that already conform to
/// `parameters_schema`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "clock", "todos").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// JSON Schema describing a successful result.
    fn result_schema(&self) -> Value;

    /// Upper bound on a single execution. `None` means unbounded.
    fn timeout(&self) -> Option<Duration> {
        None
    }

    /// Whether this tool may run concurrently with other calls of the same
    /// round. Tools that mutate shared state should return `false`.
    fn parallel_safe(&self) -> bool {
        true
    }

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: Value) -> Result<Value, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Deserialize already-validated arguments into a tool's typed input.
pub fn parse_arguments<T: DeserializeOwned>(tool_name: &str, arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::invalid_arguments(tool_name, e.to_string()))
}

/// Serialize a tool's typed output into the result value.
pub fn to_result<T: Serialize>(tool_name: &str, output: &T) -> Result<Value, ToolError> {
    serde_json::to_value(output).map_err(|e| ToolError::execution(tool_name, e))
}

/// A registry of available tools.
///
/// The agent loop uses this to:
/// 1. Get tool definitions to send to the LLM
/// 2. Dispatch the calls the LLM requests
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Names must be unique.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::DuplicateTool(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Get all tool definitions (for sending to the LLM), sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(|t| t.to_definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// List all registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Whether every call targets a tool that tolerates concurrent execution.
    ///
    /// Unknown names count as safe: they fail fast without side effects.
    pub fn all_parallel_safe(&self, calls: &[ToolCall]) -> bool {
        calls
            .iter()
            .all(|c| self.tools.get(&c.name).is_none_or(|t| t.parallel_safe()))
    }

    /// Look up, validate and execute one call. Never panics, never fails:
    /// every problem is folded into the returned result.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let start = Instant::now();
        let outcome = self.run(call).await;
        let duration = start.elapsed();

        match &outcome {
            Ok(_) => debug!(tool = %call.name, call_id = %call.id, ?duration, "Tool call succeeded"),
            Err(e) => warn!(tool = %call.name, call_id = %call.id, kind = e.kind(), error = %e, "Tool call failed"),
        }

        ToolResult {
            call_id: call.id.clone(),
            name: call.name.clone(),
            outcome,
            duration,
        }
    }

    async fn run(&self, call: &ToolCall) -> Result<Value, ToolError> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;

        let violations = schema::validate(&tool.parameters_schema(), &call.arguments);
        if !violations.is_empty() {
            return Err(ToolError::InvalidArguments {
                tool_name: call.name.clone(),
                violations,
            });
        }

        let execution = AssertUnwindSafe(tool.execute(call.arguments.clone())).catch_unwind();
        let joined = match tool.timeout() {
            Some(limit) => tokio::time::timeout(limit, execution)
                .await
                .map_err(|_| ToolError::Timeout {
                    tool_name: call.name.clone(),
                    limit,
                })?,
            None => execution.await,
        };

        let value = match joined {
            Ok(result) => result?,
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "handler panicked".into());
                return Err(ToolError::execution(&call.name, reason));
            }
        };

        let drift = schema::validate(&tool.result_schema(), &value);
        if !drift.is_empty() {
            warn!(tool = %call.name, ?drift, "Tool result does not match its declared schema");
        }

        Ok(value)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// A simple test tool for unit tests.
    struct EchoTool;

    #[derive(Deserialize)]
    struct EchoArgs {
        text: String,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str { "echo" }
        fn description(&self) -> &str { "Echoes back the input" }
        fn parameters_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" }
                },
                "required": ["text"],
                "additionalProperties": false
            })
        }
        fn result_schema(&self) -> Value {
            json!({ "type": "object", "properties": { "echo": { "type": "string" } } })
        }
        async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
            let args: EchoArgs = parse_arguments(self.name(), arguments)?;
            Ok(json!({ "echo": args.text }))
        }
    }

    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        fn name(&self) -> &str { "slow" }
        fn description(&self) -> &str { "Never finishes in time" }
        fn parameters_schema(&self) -> Value { json!({ "type": "object" }) }
        fn result_schema(&self) -> Value { json!({ "type": "object" }) }
        fn timeout(&self) -> Option<Duration> { Some(Duration::from_secs(5)) }
        async fn execute(&self, _arguments: Value) -> Result<Value, ToolError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(json!({}))
        }
    }

    struct PanickyTool;

    #[async_trait]
    impl Tool for PanickyTool {
        fn name(&self) -> &str { "panicky" }
        fn description(&self) -> &str { "Always panics" }
        fn parameters_schema(&self) -> Value { json!({ "type": "object" }) }
        fn result_schema(&self) -> Value { json!({ "type": "object" }) }
        fn parallel_safe(&self) -> bool { false }
        async fn execute(&self, _arguments: Value) -> Result<Value, ToolError> {
            panic!("boom");
        }
    }

    fn call(name: &str, arguments: Value) -> ToolCall {
        ToolCall {
            id: "call_1".into(),
            name: name.into(),
            arguments,
        }
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();
        let err = registry.register(Box::new(EchoTool)).unwrap_err();
        assert!(matches!(err, ToolError::DuplicateTool(name) if name == "echo"));
    }

    #[test]
    fn registry_definitions_are_sorted() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(SlowTool)).unwrap();
        registry.register(Box::new(EchoTool)).unwrap();
        let defs = registry.definitions();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].name, "echo");
        assert_eq!(defs[1].name, "slow");
        assert_eq!(registry.names(), vec!["echo", "slow"]);
    }

    #[tokio::test]
    async fn dispatch_executes_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();

        let result = registry.dispatch(&call("echo", json!({"text": "hello world"}))).await;
        assert!(result.is_success());
        assert_eq!(result.call_id, "call_1");
        assert_eq!(result.to_content(), r#"{"echo":"hello world"}"#);
    }

    #[tokio::test]
    async fn dispatch_unknown_tool() {
        let registry = ToolRegistry::new();
        let result = registry.dispatch(&call("nonexistent", json!({}))).await;
        assert!(matches!(result.outcome, Err(ToolError::NotFound(_))));

        let payload: Value = serde_json::from_str(&result.to_content()).unwrap();
        assert_eq!(payload["error"]["kind"], "unknown_tool");
    }

    #[tokio::test]
    async fn dispatch_rejects_nonconforming_arguments() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();

        let result = registry.dispatch(&call("echo", json!({"text": 42, "loud": true}))).await;
        let payload: Value = serde_json::from_str(&result.to_content()).unwrap();
        assert_eq!(payload["error"]["kind"], "invalid_arguments");
        let violations = payload["error"]["violations"].as_array().unwrap();
        assert_eq!(violations.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dispatch_times_out() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(SlowTool)).unwrap();

        let result = registry.dispatch(&call("slow", json!({}))).await;
        assert!(matches!(
            result.outcome,
            Err(ToolError::Timeout { limit, .. }) if limit == Duration::from_secs(5)
        ));
    }

    #[tokio::test]
    async fn dispatch_contains_panics() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(PanickyTool)).unwrap();

        let result = registry.dispatch(&call("panicky", json!({}))).await;
        match result.outcome {
            Err(ToolError::ExecutionFailed { tool_name, reason }) => {
                assert_eq!(tool_name, "panicky");
                assert!(reason.contains("boom"));
            }
            other => panic!("expected execution failure, got {other:?}"),
        }
    }

    #[test]
    fn parallel_safety_considers_every_call() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();
        registry.register(Box::new(PanickyTool)).unwrap();

        assert!(registry.all_parallel_safe(&[call("echo", json!({})), call("missing", json!({}))]));
        assert!(!registry.all_parallel_safe(&[call("echo", json!({})), call("panicky", json!({}))]));
    }

    #[test]
    fn tool_call_from_message_handles_raw_arguments() {
        let ok = ToolCall::from_message(&MessageToolCall {
            id: "a".into(),
            name: "echo".into(),
            arguments: r#"{"text":"hi"}"#.into(),
        });
        assert_eq!(ok.arguments["text"], "hi");

        let empty = ToolCall::from_message(&MessageToolCall {
            id: "b".into(),
            name: "echo".into(),
            arguments: "  ".into(),
        });
        assert_eq!(empty.arguments, json!({}));

        let garbage = ToolCall::from_message(&MessageToolCall {
            id: "c".into(),
            name: "echo".into(),
            arguments: "{not json".into(),
        });
        assert!(garbage.arguments.is_string());
    }
}
