//! Intent Parser - raw model text to ordered intents
//!
//! Models wrap JSON in prose or code fences, so the payload is taken from the
//! first `{` to the last `}`. Only the outer shape is validated; parameter
//! semantics are left to each action's schema at execution time.

use crate::error::{Error, Result};
use marionette_tools::Intent;
use serde_json::{Map, Value};

/// Summary label used when the model omits one
pub const DEFAULT_INTENT: &str = "Executed";

/// Parsed model reply
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedInstruction {
    /// Short summary of what the model intends to do
    pub intent: String,
    /// Steps in execution order
    pub intents: Vec<Intent>,
}

/// Locate the JSON object embedded in `raw`
///
/// # Errors
/// Returns [`Error::Parse`] when no `{ ... }` span exists.
pub fn extract_json(raw: &str) -> Result<&str> {
    let start = raw.find('{');
    let end = raw.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok(&raw[start..=end]),
        _ => Err(Error::Parse("no JSON object in model output".to_string())),
    }
}

/// Parse a model reply into intents
///
/// Unknown action types are kept; they fail individually at execution.
///
/// # Errors
/// Returns [`Error::Parse`] if the payload is not
/// `{"intent"?: string, "actions": [{"type": string, "params"?: object}]}`.
pub fn parse_instruction(raw: &str) -> Result<ParsedInstruction> {
    let json = extract_json(raw)?;
    let value: Value =
        serde_json::from_str(json).map_err(|e| Error::Parse(format!("malformed JSON: {e}")))?;
    let Value::Object(mut root) = value else {
        return Err(Error::Parse("payload must be a JSON object".to_string()));
    };

    let intent = match root.remove("intent") {
        None | Some(Value::Null) => DEFAULT_INTENT.to_string(),
        Some(Value::String(s)) if s.trim().is_empty() => DEFAULT_INTENT.to_string(),
        Some(Value::String(s)) => s,
        Some(other) => {
            return Err(Error::Parse(format!(
                "'intent' must be a string, got {}",
                type_name(&other)
            )))
        }
    };

    let actions = match root.remove("actions") {
        Some(Value::Array(actions)) => actions,
        Some(other) => {
            return Err(Error::Parse(format!(
                "'actions' must be an array, got {}",
                type_name(&other)
            )))
        }
        None => return Err(Error::Parse("missing 'actions' array".to_string())),
    };

    let intents = actions
        .into_iter()
        .enumerate()
        .map(|(index, action)| parse_action(index, action))
        .collect::<Result<Vec<_>>>()?;

    Ok(ParsedInstruction { intent, intents })
}

fn parse_action(index: usize, action: Value) -> Result<Intent> {
    let Value::Object(mut action) = action else {
        return Err(Error::Parse(format!("action #{index} must be an object")));
    };

    let action_type = match action.remove("type") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => {
            return Err(Error::Parse(format!(
                "action #{index} needs a non-empty string 'type'"
            )))
        }
    };

    let params = match action.remove("params") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(params)) => params,
        Some(other) => {
            return Err(Error::Parse(format!(
                "action #{index} ('{action_type}') params must be an object, got {}",
                type_name(&other)
            )))
        }
    };

    Ok(Intent {
        action_type,
        params,
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
