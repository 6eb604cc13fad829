//! Structural validation of tool arguments against their JSON Schema.
//!
//! Only the subset of JSON Schema the built-in tools declare is understood:
//! `type` (single or union), `enum`, `properties`, `required`, `items` and
//! `additionalProperties: false`. Unknown keywords are ignored.
//!
//! Validation collects every violation instead of stopping at the first one,
//! so the model gets the full structural diff and can fix all of it in a
//! single retry.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One place where the arguments disagree with the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// JSON-pointer-like path to the offending value ("" is the root).
    pub path: String,

    /// What was expected there.
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Validate `value` against `schema`, returning all violations found.
pub fn validate(schema: &Value, value: &Value) -> Vec<Violation> {
    let mut violations = Vec::new();
    validate_at(schema, value, "", &mut violations);
    violations
}

fn validate_at(schema: &Value, value: &Value, path: &str, out: &mut Vec<Violation>) {
    let Some(schema) = schema.as_object() else {
        return;
    };

    if let Some(expected) = schema.get("type") {
        let allowed: Vec<&str> = match expected {
            Value::String(t) => vec![t.as_str()],
            Value::Array(ts) => ts.iter().filter_map(Value::as_str).collect(),
            _ => vec![],
        };
        if !allowed.is_empty() && !allowed.iter().any(|t| matches_type(t, value)) {
            out.push(Violation::new(
                path,
                format!("expected {}, got {}", allowed.join(" or "), type_name(value)),
            ));
            // Nested checks are meaningless once the type is wrong.
            return;
        }
    }

    if let Some(Value::Array(options)) = schema.get("enum") {
        if !options.contains(value) {
            let listed = options
                .iter()
                .map(Value::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            out.push(Violation::new(
                path,
                format!("expected one of [{listed}], got {value}"),
            ));
        }
    }

    match value {
        Value::Object(map) => {
            let properties = schema.get("properties").and_then(Value::as_object);

            if let Some(Value::Array(required)) = schema.get("required") {
                for key in required.iter().filter_map(Value::as_str) {
                    if !map.contains_key(key) {
                        out.push(Violation::new(
                            path,
                            format!("missing required property \"{key}\""),
                        ));
                    }
                }
            }

            let closed = matches!(schema.get("additionalProperties"), Some(Value::Bool(false)));
            for (key, child) in map {
                let child_path = format!("{path}/{key}");
                match properties.and_then(|p| p.get(key)) {
                    Some(child_schema) => validate_at(child_schema, child, &child_path, out),
                    None if closed => {
                        out.push(Violation::new(child_path, "unexpected property"));
                    }
                    None => {}
                }
            }
        }
        Value::Array(items) => {
            if let Some(item_schema) = schema.get("items") {
                for (i, item) in items.iter().enumerate() {
                    validate_at(item_schema, item, &format!("{path}/{i}"), out);
                }
            }
        }
        _ => {}
    }
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
