//! Intent and result types exchanged with the executor

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One structured action request
///
/// Wire form: `{"type": "mouse.move", "params": {"x": 10, "y": 20}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// Catalog name of the action
    #[serde(rename = "type")]
    pub action_type: String,
    /// Untyped parameters, checked against the action schema at execution time
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl Intent {
    /// Create an intent with no parameters
    #[must_use]
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            params: Map::new(),
        }
    }

    /// Add a parameter
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Outcome status of one intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    /// Handler completed
    Ok,
    /// Handler failed, timed out, panicked, or the action is unknown
    Error,
}

impl ActionStatus {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

/// Result of executing one intent
///
/// Wire form: `{"type", "status", "output"?, "message"?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Action type the result belongs to
    #[serde(rename = "type")]
    pub action_type: String,
    /// Outcome
    pub status: ActionStatus,
    /// Handler output on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    /// Failure description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ActionResult {
    /// Create a successful result
    #[must_use]
    pub fn ok(action_type: impl Into<String>, output: Value) -> Self {
        Self {
            action_type: action_type.into(),
            status: ActionStatus::Ok,
            output: Some(output),
            message: None,
        }
    }

    /// Create a failed result
    #[must_use]
    pub fn error(action_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            status: ActionStatus::Error,
            output: None,
            message: Some(message.into()),
        }
    }

    /// Whether the intent succeeded
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == ActionStatus::Ok
    }
}
