//! Calculus: a terminal assistant that plans, searches, and reads the web.
//!
//! There are no subcommands: running the binary opens the interactive
//! prompt. Configuration comes from `~/.calculus/config.toml` and the
//! environment.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use calculus_agent::{AgentLoop, Session, default_system_prompt};
use calculus_config::{AppConfig, ConfigError, Credentials};
use calculus_core::event::EventBus;
use calculus_core::todo::TodoStore;
use calculus_providers::OpenAiCompatProvider;
use calculus_tools::{BrightDataClient, default_registry};
use clap::Parser;
use tracing::info;

mod render;
mod repl;
mod ui;

#[derive(Parser)]
#[command(
    name = "calculus",
    about = "Calculus: a terminal AI assistant with tools",
    version,
    author
)]
struct Cli {}

/// Resolves on Ctrl-C. If the handler cannot be installed, never resolves.
async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Resolve the config and its secrets, or the diagnostic to print instead.
fn startup(loaded: Result<AppConfig, ConfigError>) -> Result<(AppConfig, Credentials), Vec<String>> {
    let resolved = loaded.and_then(|config| {
        let credentials = config.credentials()?;
        Ok((config, credentials))
    });
    resolved.map_err(|e| config_diagnostic(&e))
}

fn config_diagnostic(error: &ConfigError) -> Vec<String> {
    vec![
        String::new(),
        format!("  Configuration error: {error}"),
        String::new(),
        "  Required environment variables:".into(),
        "    OPENAI_API_KEY            model API key".into(),
        "    OPENAI_BASE_URL           e.g. https://openrouter.ai/api/v1".into(),
        "    BRIGHTDATA_API_KEY        Bright Data API token".into(),
        "    BRIGHTDATA_UNLOCKER_ZONE  Web Unlocker zone name".into(),
        String::new(),
        "  Optional config file:".into(),
        format!("    {}", AppConfig::config_dir().join("config.toml").display()),
        String::new(),
    ]
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let (config, credentials) = match startup(AppConfig::load()) {
        Ok(resolved) => resolved,
        Err(diagnostic) => {
            for line in diagnostic {
                eprintln!("{line}");
            }
            return Ok(ExitCode::FAILURE);
        }
    };
    let cwd = std::env::current_dir()?;

    let provider = Arc::new(OpenAiCompatProvider::from_config(&config, &credentials)?);
    let brightdata = Arc::new(BrightDataClient::from_credentials(
        &credentials,
        Duration::from_secs(config.tools.timeout_secs),
    )?);
    let store = Arc::new(TodoStore::new());
    let tools = Arc::new(default_registry(store.clone(), brightdata)?);
    let event_bus = Arc::new(EventBus::default());

    info!(
        model = %config.model.name,
        tools = ?tools.names(),
        max_rounds = config.agent.max_tool_rounds,
        "Starting Calculus"
    );

    let agent = AgentLoop::from_config(provider, tools, event_bus, &config);
    let system_prompt = config
        .agent
        .system_prompt
        .clone()
        .unwrap_or_else(|| default_system_prompt(&cwd));
    let mut session = Session::new(agent, store, system_prompt);

    let mut stdout = std::io::stdout();
    print!("{}", ui::CLEAR_SCREEN);
    for line in ui::welcome_box(&cwd) {
        println!("{line}");
    }

    repl::run(&mut session, repl::stdin_lines(), &mut stdout, &cwd, ctrl_c).await?;

    Ok(ExitCode::SUCCESS)
}
