//! Fetch tool: a web page as clean markdown.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use calculus_core::error::ToolError;
use calculus_core::schema::Violation;
use calculus_core::tool::{Tool, parse_arguments, to_result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::brightdata::BrightDataClient;

#[derive(Debug, Deserialize)]
struct FetchArgs {
    url: String,
}

#[derive(Debug, Serialize)]
struct FetchOutput {
    content: String,
}

pub struct FetchTool {
    client: Arc<BrightDataClient>,
}

impl FetchTool {
    pub fn new(client: Arc<BrightDataClient>) -> Self {
        Self { client }
    }
}

fn check_url(tool_name: &str, raw: &str) -> Result<Url, ToolError> {
    let invalid = |message: String| ToolError::InvalidArguments {
        tool_name: tool_name.to_string(),
        violations: vec![Violation::new("/url", message)],
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(format!("not a valid URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme \"{other}\", expected http or https"))),
    }
}

#[async_trait]
impl Tool for FetchTool {
    fn name(&self) -> &str {
        "fetch"
    }

    fn description(&self) -> &str {
        "Extract webpage content as clean markdown. Input: a valid http(s) URL. Output: markdown content."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The URL to scrape (must be a valid http or https URL)"
                }
            },
            "required": ["url"],
            "additionalProperties": false
        })
    }

    fn result_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "Scraped webpage content formatted as markdown"
                }
            },
            "required": ["content"]
        })
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.client.timeout())
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: FetchArgs = parse_arguments(self.name(), arguments)?;
        let url = check_url(self.name(), &args.url)?;
        let content = self.client.unlock(self.name(), url.as_str()).await?;
        to_result(self.name(), &FetchOutput { content })
    }
}
