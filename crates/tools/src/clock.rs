//! Clock tool: the current date and time in one of three formats.

use async_trait::async_trait;
use calculus_core::error::ToolError;
use calculus_core::tool::{Tool, parse_arguments, to_result};
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockFormat {
    Short,
    Long,
    Iso,
}

#[derive(Debug, Deserialize)]
struct ClockArgs {
    format: ClockFormat,
}

#[derive(Debug, Serialize)]
struct ClockOutput {
    datetime: String,
}

/// Render `now` in the requested format. `short` and `long` use the local
/// timezone; `iso` is always UTC with millisecond precision.
pub fn render(format: ClockFormat, now: DateTime<Utc>) -> String {
    match format {
        ClockFormat::Iso => now.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        local => render_local(local, &now.with_timezone(&Local).naive_local()),
    }
}

fn render_local(format: ClockFormat, local: &NaiveDateTime) -> String {
    match format {
        ClockFormat::Long => local.format("%A, %B %-d, %Y at %I:%M:%S %p").to_string(),
        _ => local.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
    }
}

pub struct ClockTool;

#[async_trait]
impl Tool for ClockTool {
    fn name(&self) -> &str {
        "clock"
    }

    fn description(&self) -> &str {
        "Get the current date and time in the user's local timezone.\n\
         Use when you need the current timestamp, scheduling, or time-based reasoning.\n\
         Format options:\n\
         - 'short': localized format like \"8/16/2025, 3:57:12 PM\"\n\
         - 'long': full format like \"Friday, August 16, 2025 at 03:57:12 PM\"\n\
         - 'iso': ISO 8601 in UTC like \"2025-08-16T20:57:12.345Z\""
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "format": {
                    "type": "string",
                    "enum": ["short", "long", "iso"],
                    "description": "Time format: 'short', 'long', or 'iso'"
                }
            },
            "required": ["format"],
            "additionalProperties": false
        })
    }

    fn result_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "datetime": {
                    "type": "string",
                    "description": "The current date and time in the requested format"
                }
            },
            "required": ["datetime"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: ClockArgs = parse_arguments(self.name(), arguments)?;
        to_result(
            self.name(),
            &ClockOutput {
                datetime: render(args.format, Utc::now()),
            },
        )
    }
}
