//! Configuration loading, validation, and management for Calculus.
//!
//! Loads configuration from `~/.calculus/config.toml` (optional) with
//! environment variable overrides. Secrets normally come from the
//! environment only. Everything is validated at startup so a bad setup fails
//! before the first prompt, not in the middle of a conversation.

use calculus_core::ReasoningEffort;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the model API key.
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Environment variable holding the model endpoint base URL.
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
/// Environment variable holding the Bright Data bearer token.
pub const ENV_BRIGHTDATA_API_KEY: &str = "BRIGHTDATA_API_KEY";
/// Environment variable holding the Bright Data unlocker zone.
pub const ENV_BRIGHTDATA_ZONE: &str = "BRIGHTDATA_UNLOCKER_ZONE";
/// Environment variable overriding the model identifier.
pub const ENV_MODEL: &str = "CALCULUS_MODEL";

/// The root configuration structure.
///
/// Maps directly to `~/.calculus/config.toml`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model selection and sampling
    #[serde(default)]
    pub model: ModelConfig,

    /// Agent loop behaviour
    #[serde(default)]
    pub agent: AgentConfig,

    /// Tool execution settings
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Model endpoint credentials and attribution headers
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Search/fetch proxy credentials
    #[serde(default)]
    pub brightdata: BrightDataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model")]
    pub name: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<ReasoningEffort>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_model() -> String {
    "anthropic/claude-sonnet-4".into()
}
fn default_temperature() -> f32 {
    0.5
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            temperature: default_temperature(),
            top_p: None,
            reasoning_effort: None,
            max_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum model rounds per user turn before giving up
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,

    /// Run the calls of one round concurrently when every tool allows it
    #[serde(default)]
    pub parallel_tool_calls: bool,

    /// Replace the built-in system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

fn default_max_tool_rounds() -> u32 {
    25
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: default_max_tool_rounds(),
            parallel_tool_calls: false,
            system_prompt: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Timeout for network-bound tools
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Sent as `HTTP-Referer`
    #[serde(default = "default_referer")]
    pub referer: String,

    /// Sent as `X-Title`
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_referer() -> String {
    "https://thesobercoder.in".into()
}
fn default_title() -> String {
    "Calculus".into()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            referer: default_referer(),
            title: default_title(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct BrightDataConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("model", &self.model)
            .field("agent", &self.agent)
            .field("tools", &self.tools)
            .field("provider", &self.provider)
            .field("brightdata", &self.brightdata)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("referer", &self.referer)
            .field("title", &self.title)
            .finish()
    }
}

impl std::fmt::Debug for BrightDataConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrightDataConfig")
            .field("api_key", &redact(&self.api_key))
            .field("zone", &self.zone)
            .finish()
    }
}

/// Every secret the process needs, resolved and non-empty.
#[derive(Clone)]
pub struct Credentials {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub brightdata_api_key: String,
    pub brightdata_zone: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("openai_api_key", &"[REDACTED]")
            .field("openai_base_url", &self.openai_base_url)
            .field("brightdata_api_key", &"[REDACTED]")
            .field("brightdata_zone", &self.brightdata_zone)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.calculus/config.toml),
    /// then apply environment overrides and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with(&config_path, |key| std::env::var(key).ok())
    }

    /// Load from `path`, overriding with values returned by `env`.
    pub fn load_with(path: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(env);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Environment variables take precedence over the file. Empty values are
    /// treated as unset.
    pub fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(ENV_OPENAI_API_KEY) {
            self.provider.api_key = Some(key);
        }
        if let Some(url) = get(ENV_OPENAI_BASE_URL) {
            self.provider.base_url = Some(url);
        }
        if let Some(key) = get(ENV_BRIGHTDATA_API_KEY) {
            self.brightdata.api_key = Some(key);
        }
        if let Some(zone) = get(ENV_BRIGHTDATA_ZONE) {
            self.brightdata.zone = Some(zone);
        }
        if let Some(model) = get(ENV_MODEL) {
            self.model.name = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".calculus")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ConfigError::ValidationError(
                "model.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if let Some(top_p) = self.model.top_p {
            if !(top_p > 0.0 && top_p <= 1.0) {
                return Err(ConfigError::ValidationError(
                    "model.top_p must be in (0.0, 1.0]".into(),
                ));
            }
        }

        if self.agent.max_tool_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_tool_rounds must be at least 1".into(),
            ));
        }

        if self.tools.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "tools.timeout_secs must be at least 1".into(),
            ));
        }

        self.credentials().map(|_| ())
    }

    /// Resolve every required secret, naming all that are missing at once.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let mut missing = Vec::new();
        let mut take = |value: &Option<String>, var: &str| match value {
            Some(v) if !v.trim().is_empty() => v.clone(),
            _ => {
                missing.push(var.to_string());
                String::new()
            }
        };

        let creds = Credentials {
            openai_api_key: take(&self.provider.api_key, ENV_OPENAI_API_KEY),
            openai_base_url: take(&self.provider.base_url, ENV_OPENAI_BASE_URL),
            brightdata_api_key: take(&self.brightdata.api_key, ENV_BRIGHTDATA_API_KEY),
            brightdata_zone: take(&self.brightdata.zone, ENV_BRIGHTDATA_ZONE),
        };

        if missing.is_empty() {
            Ok(creds)
        } else {
            Err(ConfigError::MissingVariables(missing))
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingVariables(Vec<String>),
}
