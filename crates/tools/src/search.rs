//! Web search through Google, Bing or Yandex, returned as markdown.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use calculus_core::error::ToolError;
use calculus_core::tool::{Tool, parse_arguments, to_result};
use serde::{Deserialize, Serialize};

use crate::brightdata::BrightDataClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Google,
    Bing,
    Yandex,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    engine: Engine,
    #[serde(default)]
    cursor: Option<String>,
}

#[derive(Debug, Serialize)]
struct SearchOutput {
    results: String,
}

/// The results page URL for `query` on `engine`.
pub fn search_url(engine: Engine, query: &str, cursor: Option<&str>) -> String {
    let query = urlencoding::encode(query);
    let cursor = cursor
        .filter(|c| !c.is_empty())
        .map(|c| format!("&cursor={}", urlencoding::encode(c)))
        .unwrap_or_default();

    match engine {
        Engine::Google => format!("https://www.google.com/search?q={query}{cursor}"),
        Engine::Bing => format!("https://www.bing.com/search?q={query}{cursor}"),
        Engine::Yandex => format!("https://yandex.com/search/?text={query}{cursor}"),
    }
}

pub struct SearchTool {
    client: Arc<BrightDataClient>,
}

impl SearchTool {
    pub fn new(client: Arc<BrightDataClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search the web using Google, Bing, or Yandex. Returns search result links and snippets as markdown."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query to execute"
                },
                "engine": {
                    "type": "string",
                    "enum": ["google", "bing", "yandex"],
                    "description": "Search engine to use (recommended: google)"
                },
                "cursor": {
                    "type": ["string", "null"],
                    "description": "Pagination cursor for the next page"
                }
            },
            "required": ["query", "engine"],
            "additionalProperties": false
        })
    }

    fn result_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "results": {
                    "type": "string",
                    "description": "Search results formatted as markdown"
                }
            },
            "required": ["results"]
        })
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.client.timeout())
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: SearchArgs = parse_arguments(self.name(), arguments)?;
        let target = search_url(args.engine, &args.query, args.cursor.as_deref());
        let results = self.client.unlock(self.name(), &target).await?;
        to_result(self.name(), &SearchOutput { results })
    }
}
