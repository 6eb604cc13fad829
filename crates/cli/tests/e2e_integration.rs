//! End-to-end integration tests for Calculus.
//!
//! These wire the real tools, todo store, agent loop and session together
//! with a scripted model, and point the network tools at a mock Bright Data
//! endpoint.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use calculus_agent::{AgentLoop, ReplCommand, Session, TurnOutcome, default_system_prompt};
use calculus_config::{AppConfig, ConfigError};
use calculus_core::error::ProviderError;
use calculus_core::event::{AgentEvent, EventBus};
use calculus_core::message::{Message, MessageToolCall, Role};
use calculus_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use calculus_core::todo::{TodoStatus, TodoStore};
use calculus_tools::{BrightDataClient, default_registry};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted responses in sequence and keeps
/// every request it was sent.
struct ScriptedProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            panic!("ScriptedProvider exhausted");
        }
        Ok(responses.remove(0))
    }
}

fn usage() -> Option<Usage> {
    Some(Usage {
        prompt_tokens: 10,
        completion_tokens: 5,
        total_tokens: 15,
    })
}

fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: usage(),
        model: "mock".into(),
    }
}

fn tool_response(tool_calls: Vec<MessageToolCall>) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant_with_tools("", tool_calls),
        usage: usage(),
        model: "mock".into(),
    }
}

fn make_tool_call(id: &str, name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments: serde_json::to_string(&args).unwrap(),
    }
}

// ── Harness ──────────────────────────────────────────────────────────────

struct Harness {
    session: Session,
    store: Arc<TodoStore>,
    provider: Arc<ScriptedProvider>,
    events: tokio::sync::broadcast::Receiver<Arc<AgentEvent>>,
}

fn harness(responses: Vec<ProviderResponse>, brightdata_endpoint: &str, max_rounds: u32) -> Harness {
    let provider = Arc::new(ScriptedProvider::new(responses));
    let store = Arc::new(TodoStore::new());
    let brightdata = BrightDataClient::new("bd-key", "unlocker", Duration::from_secs(30))
        .unwrap()
        .with_endpoint(brightdata_endpoint);
    let tools = Arc::new(default_registry(store.clone(), Arc::new(brightdata)).unwrap());
    let bus = Arc::new(EventBus::default());
    let events = bus.subscribe();

    let mut config = AppConfig::default();
    config.agent.max_tool_rounds = max_rounds;
    let agent = AgentLoop::from_config(provider.clone(), tools, bus, &config);
    let session = Session::new(agent, store.clone(), default_system_prompt(Path::new("/work")));

    Harness {
        session,
        store,
        provider,
        events,
    }
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<Arc<AgentEvent>>) -> Vec<Arc<AgentEvent>> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn tool_messages(request: &ProviderRequest) -> Vec<&Message> {
    request.messages.iter().filter(|m| m.role == Role::Tool).collect()
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_plan_a_three_day_trip() {
    let mut h = harness(
        vec![
            tool_response(vec![make_tool_call(
                "call_todos",
                "todos",
                serde_json::json!({"todos": [
                    {"content": "Day 1: Alfama and the castle", "status": "pending"},
                    {"content": "Day 2: Belém", "status": "pending"},
                    {"content": "Day 3: Sintra day trip", "status": "pending"}
                ]}),
            )]),
            text_response("Here is your 3-day plan for Lisbon."),
        ],
        "http://127.0.0.1:9/request",
        25,
    );

    let outcome = h
        .session
        .turn_until("Plan a 3-day trip to Lisbon", std::future::pending())
        .await;
    let summary = match outcome {
        TurnOutcome::Answered(summary) => summary,
        other => panic!("expected an answer, got {other:?}"),
    };
    assert_eq!(summary.answer, "Here is your 3-day plan for Lisbon.");
    assert_eq!(summary.rounds, 2);
    assert_eq!(summary.tool_calls_made, 1);

    let todos = h.store.snapshot().await;
    assert_eq!(todos.len(), 3);
    assert!(todos.iter().all(|t| t.status == TodoStatus::Pending));

    let events = drain(&mut h.events);
    let answers = events
        .iter()
        .filter(|e| matches!(e.as_ref(), AgentEvent::Answer { .. }))
        .count();
    assert_eq!(answers, 1);
    assert_eq!(events.last().unwrap().event_type(), "done");

    // Back at the prompt: the conversation ends with the assistant's answer.
    let last = h.session.conversation().messages.last().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert!(h.session.conversation().pending_tool_calls().is_empty());
}

#[tokio::test]
async fn e2e_invalid_status_is_rejected_before_the_store() {
    let mut h = harness(
        vec![
            tool_response(vec![make_tool_call(
                "call_bad",
                "todos",
                serde_json::json!({"todos": [{"content": "Pack bags", "status": "done"}]}),
            )]),
            text_response("Sorry, let me fix that."),
        ],
        "http://127.0.0.1:9/request",
        25,
    );

    h.session.turn("Track my packing").await.unwrap();

    assert!(h.store.snapshot().await.is_empty());

    let second = &h.provider.requests()[1];
    let results = tool_messages(second);
    assert_eq!(results.len(), 1);
    let body: serde_json::Value = serde_json::from_str(&results[0].content).unwrap();
    assert_eq!(body["error"]["kind"], "invalid_arguments");
    assert_eq!(body["error"]["violations"][0]["path"], "/todos/0/status");
}

#[tokio::test]
async fn e2e_round_results_follow_call_order_when_one_fails() {
    let mut h = harness(
        vec![
            tool_response(vec![
                make_tool_call("a", "clock", serde_json::json!({"format": "iso"})),
                make_tool_call("b", "fetch", serde_json::json!({"url": "ftp://example.com/file"})),
                make_tool_call("c", "clock", serde_json::json!({"format": "short"})),
            ]),
            text_response("done"),
        ],
        "http://127.0.0.1:9/request",
        25,
    );

    h.session.turn("what time is it, and grab that file").await.unwrap();

    let second = &h.provider.requests()[1];
    let results = tool_messages(second);
    let ids: Vec<_> = results.iter().map(|m| m.tool_call_id.as_deref().unwrap()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert!(results[0].content.contains("datetime"));
    assert!(results[1].content.contains("invalid_arguments"));
    assert!(results[2].content.contains("datetime"));
}

#[tokio::test]
async fn e2e_search_goes_through_the_unlocker() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/request"))
        .and(header("Authorization", "Bearer bd-key"))
        .and(body_partial_json(serde_json::json!({
            "url": "https://www.google.com/search?q=rust%20tokio&cursor=2",
            "zone": "unlocker",
            "format": "raw",
            "data_format": "markdown"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("1. [Tokio](https://tokio.rs)"))
        .expect(1)
        .mount(&server)
        .await;

    let mut h = harness(
        vec![
            tool_response(vec![make_tool_call(
                "call_search",
                "search",
                serde_json::json!({"query": "rust tokio", "engine": "google", "cursor": "2"}),
            )]),
            text_response("Tokio is an async runtime."),
        ],
        &format!("{}/request", server.uri()),
        25,
    );

    h.session.turn("what is tokio?").await.unwrap();

    let second = &h.provider.requests()[1];
    let body: serde_json::Value = serde_json::from_str(&tool_messages(second)[0].content).unwrap();
    assert_eq!(body["results"], "1. [Tokio](https://tokio.rs)");
}

#[tokio::test]
async fn e2e_unlocker_failure_is_an_error_result_not_a_crash() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(407).set_body_string("zone disabled"))
        .mount(&server)
        .await;

    let mut h = harness(
        vec![
            tool_response(vec![make_tool_call(
                "call_fetch",
                "fetch",
                serde_json::json!({"url": "https://example.com"}),
            )]),
            text_response("I could not load that page."),
        ],
        &format!("{}/request", server.uri()),
        25,
    );

    let summary = h.session.turn("read example.com").await.unwrap();
    assert_eq!(summary.answer, "I could not load that page.");

    let second = &h.provider.requests()[1];
    let content = &tool_messages(second)[0].content;
    assert!(content.contains("execution_failed"));
    assert!(content.contains("407"));
    assert!(content.contains("zone disabled"));
}

#[tokio::test]
async fn e2e_round_cap_aborts_turn_but_keeps_conversation() {
    let looping = (0..2)
        .map(|i| {
            tool_response(vec![make_tool_call(
                &format!("call_{i}"),
                "clock",
                serde_json::json!({"format": "iso"}),
            )])
        })
        .chain(std::iter::once(text_response("recovered")))
        .collect();
    let mut h = harness(looping, "http://127.0.0.1:9/request", 2);

    let err = h.session.turn("keep checking the time").await.unwrap_err();
    assert!(matches!(err, calculus_core::Error::ToolLoopExceeded { max_rounds: 2 }));
    // system + user + 2 x (assistant + result)
    assert_eq!(h.session.conversation().messages.len(), 6);

    let events = drain(&mut h.events);
    assert_eq!(events.last().unwrap().event_type(), "error");

    let summary = h.session.turn("ok, stop").await.unwrap();
    assert_eq!(summary.answer, "recovered");
}

#[tokio::test]
async fn e2e_clear_resets_conversation_and_todos() {
    let mut h = harness(
        vec![
            tool_response(vec![make_tool_call(
                "call_todos",
                "todos",
                serde_json::json!({"todos": [{"content": "a", "status": "in_progress"}]}),
            )]),
            text_response("Working on it."),
        ],
        "http://127.0.0.1:9/request",
        25,
    );

    h.session.turn("start").await.unwrap();
    assert_eq!(h.store.snapshot().await.len(), 1);

    assert_eq!(ReplCommand::parse("  CLEAR "), ReplCommand::Clear);
    h.session.reset().await;

    assert!(h.store.snapshot().await.is_empty());
    assert_eq!(h.session.conversation().messages.len(), 1);
    assert_eq!(h.session.conversation().messages[0].role, Role::System);
}

#[test]
fn e2e_exit_determinism() {
    for line in ["exit", "EXIT", "  quit  ", "Quit"] {
        assert_eq!(ReplCommand::parse(line), ReplCommand::Exit, "{line:?}");
    }
    for line in ["exits", "quit now", "ex it"] {
        assert!(matches!(ReplCommand::parse(line), ReplCommand::Prompt(_)), "{line:?}");
    }
}

#[test]
fn e2e_missing_environment_fails_at_startup() {
    let dir = tempfile::tempdir().unwrap();
    let err = AppConfig::load_with(&dir.path().join("config.toml"), |key| match key {
        "OPENAI_API_KEY" => Some("sk-test".into()),
        _ => None,
    })
    .unwrap_err();

    match err {
        ConfigError::MissingVariables(vars) => {
            assert_eq!(
                vars,
                vec!["OPENAI_BASE_URL", "BRIGHTDATA_API_KEY", "BRIGHTDATA_UNLOCKER_ZONE"]
            );
        }
        other => panic!("expected MissingVariables, got {other:?}"),
    }
}
