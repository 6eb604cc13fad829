//! Bright Data Web Unlocker client shared by `search` and `fetch`.
//!
//! Both tools ask the unlocker to load a URL and hand back the page as
//! markdown. The unlocker deals with proxies, captchas and rendering.

use std::time::Duration;

use calculus_config::Credentials;
use calculus_core::error::ToolError;
use serde::Serialize;
use tracing::{debug, warn};

const DEFAULT_ENDPOINT: &str = "https://api.brightdata.com/request";

/// Longest slice of an error body carried into a tool error.
const ERROR_EXCERPT_CHARS: usize = 200;

#[derive(Debug, Serialize)]
struct UnlockerRequest<'a> {
    url: &'a str,
    zone: &'a str,
    format: &'static str,
    data_format: &'static str,
}

pub struct BrightDataClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    zone: String,
    timeout: Duration,
}

impl BrightDataClient {
    pub fn new(
        api_key: impl Into<String>,
        zone: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            endpoint: DEFAULT_ENDPOINT.into(),
            api_key: api_key.into(),
            zone: zone.into(),
            timeout,
        })
    }

    pub fn from_credentials(credentials: &Credentials, timeout: Duration) -> Result<Self, reqwest::Error> {
        Self::new(
            &credentials.brightdata_api_key,
            &credentials.brightdata_zone,
            timeout,
        )
    }

    /// Point the client somewhere other than the public API.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// How long a single unlock may take.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch `target_url` through the unlocker and return the markdown body.
    pub async fn unlock(&self, tool_name: &str, target_url: &str) -> Result<String, ToolError> {
        let body = UnlockerRequest {
            url: target_url,
            zone: &self.zone,
            format: "raw",
            data_format: "markdown",
        };

        debug!(tool = tool_name, url = target_url, "Requesting page through unlocker");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ToolError::execution(tool_name, format!("request failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ToolError::execution(tool_name, format!("failed to read response: {e}")))?;

        if !status.is_success() {
            warn!(tool = tool_name, status = status.as_u16(), "Unlocker returned error");
            return Err(ToolError::execution(
                tool_name,
                format!("Bright Data returned {}: {}", status.as_u16(), excerpt(&text)),
            ));
        }

        Ok(text)
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= ERROR_EXCERPT_CHARS {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(ERROR_EXCERPT_CHARS).collect();
        format!("{cut}...")
    }
}
