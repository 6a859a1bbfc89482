//! Registry - Action registration and discovery
//!
//! The catalog maps action names (`mouse.move`, `file.read`, ...) to handlers.
//! Each handler declares its parameters so intents can be checked before
//! anything touches the host.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Action category for organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionCategory {
    /// Pointer operations
    Mouse,
    /// Keyboard operations
    Keyboard,
    /// Workspace file operations
    File,
    /// Host information and pacing
    System,
}

impl ActionCategory {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mouse => "mouse",
            Self::Keyboard => "keyboard",
            Self::File => "file",
            Self::System => "system",
        }
    }
}

/// Accepted JSON type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// Whole number (`10` or `10.0`)
    Integer,
    /// Any number
    Number,
    /// String
    String,
    /// Boolean
    Boolean,
    /// Key list: array of strings or a `+`-joined string
    Keys,
}

impl ParamKind {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Keys => "keys",
        }
    }

    /// Whether `value` has this type
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Integer => as_whole_number(value).is_some(),
            Self::Number => value.is_number(),
            Self::String => value.is_string(),
            Self::Boolean => value.is_boolean(),
            Self::Keys => match value {
                Value::String(_) => true,
                Value::Array(items) => !items.is_empty() && items.iter().all(Value::is_string),
                _ => false,
            },
        }
    }
}

/// One declared parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name
    pub name: String,
    /// Accepted type
    pub kind: ParamKind,
    /// Whether the parameter must be present
    pub required: bool,
}

/// Action metadata and parameter schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDefinition {
    /// Unique action name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Category
    pub category: ActionCategory,
    /// Declared parameters
    pub params: Vec<ParamSpec>,
    /// Whether the executor pauses after this action
    #[serde(default)]
    pub paced: bool,
    /// Longest run the handler accepts by its own schema; the executor never
    /// times it out sooner
    #[serde(skip)]
    pub min_timeout: Option<Duration>,
}

impl ActionDefinition {
    /// Create a new action definition
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            category: ActionCategory::System,
            params: Vec::new(),
            paced: false,
            min_timeout: None,
        }
    }

    /// Set the category
    #[must_use]
    pub fn with_category(mut self, category: ActionCategory) -> Self {
        self.category = category;
        self
    }

    /// Declare a required parameter
    #[must_use]
    pub fn with_required(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            kind,
            required: true,
        });
        self
    }

    /// Declare an optional parameter
    #[must_use]
    pub fn with_optional(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            kind,
            required: false,
        });
        self
    }

    /// Mark the action as host input that must be followed by a pause
    #[must_use]
    pub fn paced(mut self) -> Self {
        self.paced = true;
        self
    }

    /// Guarantee the handler at least `timeout` before the executor gives up
    #[must_use]
    pub fn with_min_timeout(mut self, timeout: Duration) -> Self {
        self.min_timeout = Some(timeout);
        self
    }

    /// Check `params` against the declared schema
    ///
    /// Undeclared keys are ignored; `null` counts as absent.
    pub fn validate(&self, params: &Map<String, Value>) -> Result<()> {
        for spec in &self.params {
            match params.get(&spec.name) {
                None | Some(Value::Null) if spec.required => {
                    return Err(Error::InvalidInput(format!(
                        "missing required parameter '{}'",
                        spec.name
                    )));
                }
                None | Some(Value::Null) => {}
                Some(value) if !spec.kind.accepts(value) => {
                    return Err(Error::InvalidInput(format!(
                        "parameter '{}' must be {}, got {}",
                        spec.name,
                        spec.kind.as_str(),
                        value
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Compact signature, e.g. `mouse.move{x:integer, y:integer, duration?:number}`
    #[must_use]
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| {
                let marker = if p.required { "" } else { "?" };
                format!("{}{}:{}", p.name, marker, p.kind.as_str())
            })
            .collect();
        format!("{}{{{}}}", self.name, params.join(", "))
    }
}

/// Trait for action implementations
#[async_trait::async_trait]
pub trait Action: Send + Sync {
    /// Get the action definition
    fn definition(&self) -> &ActionDefinition;

    /// Execute the action with validated parameters
    async fn execute(&self, params: &Map<String, Value>) -> Result<Value>;

    /// Validate parameters before execution
    fn validate_params(&self, params: &Map<String, Value>) -> Result<()> {
        self.definition().validate(params)
    }
}

/// Registry for managing actions
#[derive(Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action, replacing any previous one with the same name
    pub fn register(&mut self, action: Arc<dyn Action>) {
        let name = action.definition().name.clone();
        debug!(action = %name, "Registering action");
        self.actions.insert(name, action);
    }

    /// Get an action by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Action>> {
        self.actions.get(name).cloned()
    }

    /// Check if an action exists
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// All definitions, sorted by name
    #[must_use]
    pub fn list_definitions(&self) -> Vec<&ActionDefinition> {
        let mut defs: Vec<&ActionDefinition> =
            self.actions.values().map(|a| a.definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// One line per action, for embedding in an instruction template
    #[must_use]
    pub fn catalog_text(&self) -> String {
        let mut out = String::new();
        for def in self.list_definitions() {
            let _ = writeln!(out, "- {}: {}", def.signature(), def.description);
        }
        out
    }

    /// Get action count
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Check if registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

// ============================================================================
// Parameter access
// ============================================================================

fn as_whole_number(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn wrong_type(key: &str, kind: ParamKind) -> Error {
    Error::InvalidInput(format!("parameter '{}' must be {}", key, kind.as_str()))
}

fn missing(key: &str) -> Error {
    Error::InvalidInput(format!("missing required parameter '{}'", key))
}

/// Optional integer parameter
pub fn opt_i64(params: &Map<String, Value>, key: &str) -> Result<Option<i64>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => as_whole_number(v)
            .map(Some)
            .ok_or_else(|| wrong_type(key, ParamKind::Integer)),
    }
}

/// Required integer parameter
pub fn req_i64(params: &Map<String, Value>, key: &str) -> Result<i64> {
    opt_i64(params, key)?.ok_or_else(|| missing(key))
}

/// Optional number parameter
pub fn opt_f64(params: &Map<String, Value>, key: &str) -> Result<Option<f64>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| wrong_type(key, ParamKind::Number)),
    }
}

/// Required number parameter
pub fn req_f64(params: &Map<String, Value>, key: &str) -> Result<f64> {
    opt_f64(params, key)?.ok_or_else(|| missing(key))
}

/// Optional string parameter
pub fn opt_str<'a>(params: &'a Map<String, Value>, key: &str) -> Result<Option<&'a str>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_str()
            .map(Some)
            .ok_or_else(|| wrong_type(key, ParamKind::String)),
    }
}

/// Required string parameter
pub fn req_str<'a>(params: &'a Map<String, Value>, key: &str) -> Result<&'a str> {
    opt_str(params, key)?.ok_or_else(|| missing(key))
}

/// Optional boolean parameter
pub fn opt_bool(params: &Map<String, Value>, key: &str) -> Result<Option<bool>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_bool()
            .map(Some)
            .ok_or_else(|| wrong_type(key, ParamKind::Boolean)),
    }
}

/// Required key list: `["ctrl", "c"]` or `"ctrl+c"`
pub fn req_keys(params: &Map<String, Value>, key: &str) -> Result<Vec<String>> {
    let keys: Vec<String> = match params.get(key) {
        None | Some(Value::Null) => return Err(missing(key)),
        Some(Value::String(s)) => s.split('+').map(|k| k.trim().to_string()).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(|s| s.trim().to_string())
                    .ok_or_else(|| wrong_type(key, ParamKind::Keys))
            })
            .collect::<Result<_>>()?,
        Some(_) => return Err(wrong_type(key, ParamKind::Keys)),
    };

    if keys.is_empty() || keys.iter().any(String::is_empty) {
        return Err(Error::InvalidInput(format!(
            "parameter '{}' contains an empty key",
            key
        )));
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn move_definition() -> ActionDefinition {
        ActionDefinition::new("mouse.move", "Move the pointer")
            .with_category(ActionCategory::Mouse)
            .with_required("x", ParamKind::Integer)
            .with_required("y", ParamKind::Integer)
            .with_optional("duration", ParamKind::Number)
            .paced()
    }

    #[test]
    fn test_definition_builder() {
        let def = move_definition();
        assert_eq!(def.name, "mouse.move");
        assert_eq!(def.category, ActionCategory::Mouse);
        assert_eq!(def.params.len(), 3);
        assert!(def.paced);
        assert_eq!(
            def.signature(),
            "mouse.move{x:integer, y:integer, duration?:number}"
        );
    }

    #[test]
    fn test_validate_accepts_well_typed() {
        let def = move_definition();
        assert!(def.validate(&params(json!({"x": 10, "y": 20.0}))).is_ok());
        assert!(def
            .validate(&params(json!({"x": 1, "y": 2, "duration": 0.5, "extra": "ignored"})))
            .is_ok());
        assert!(def
            .validate(&params(json!({"x": 1, "y": 2, "duration": null})))
            .is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_and_mistyped() {
        let def = move_definition();

        let err = def.validate(&params(json!({"x": 10}))).unwrap_err();
        assert!(err.to_string().contains("missing required parameter 'y'"));

        let err = def.validate(&params(json!({"x": "10", "y": 5}))).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        assert!(def.validate(&params(json!({"x": 1.5, "y": 5}))).is_err());
        assert!(def.validate(&params(json!({"x": null, "y": 5}))).is_err());
    }

    #[test]
    fn test_keys_param() {
        let p = params(json!({"a": ["ctrl", "c"], "b": "ctrl + shift+t", "c": [], "d": 5}));
        assert_eq!(req_keys(&p, "a").unwrap(), vec!["ctrl", "c"]);
        assert_eq!(req_keys(&p, "b").unwrap(), vec!["ctrl", "shift", "t"]);
        assert!(req_keys(&p, "c").is_err());
        assert!(req_keys(&p, "d").is_err());
        assert!(req_keys(&p, "missing").is_err());
        assert!(!ParamKind::Keys.accepts(&json!([])));
    }

    #[test]
    fn test_param_accessors() {
        let p = params(json!({"n": 3, "f": 0.25, "s": "hi", "b": true}));
        assert_eq!(req_i64(&p, "n").unwrap(), 3);
        assert_eq!(req_f64(&p, "n").unwrap(), 3.0);
        assert_eq!(req_f64(&p, "f").unwrap(), 0.25);
        assert_eq!(req_str(&p, "s").unwrap(), "hi");
        assert_eq!(opt_bool(&p, "b").unwrap(), Some(true));
        assert_eq!(opt_i64(&p, "missing").unwrap(), None);
        assert!(req_i64(&p, "s").is_err());
        assert!(req_str(&p, "missing").is_err());
    }

    struct Noop(ActionDefinition);

    #[async_trait::async_trait]
    impl Action for Noop {
        fn definition(&self) -> &ActionDefinition {
            &self.0
        }

        async fn execute(&self, _params: &Map<String, Value>) -> Result<Value> {
            Ok(Value::Null)
        }
    }

    #[test]
    fn test_registry_listing_is_sorted() {
        let mut registry = ActionRegistry::new();
        assert!(registry.is_empty());
        registry.register(Arc::new(Noop(ActionDefinition::new("system.info", "Host info"))));
        registry.register(Arc::new(Noop(move_definition())));

        assert_eq!(registry.len(), 2);
        assert!(registry.has("mouse.move"));
        assert!(registry.get("browser.open").is_none());

        let names: Vec<&str> = registry
            .list_definitions()
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, vec!["mouse.move", "system.info"]);

        let text = registry.catalog_text();
        assert!(text.starts_with("- mouse.move{x:integer"));
        assert!(text.contains("- system.info{}: Host info\n"));
    }
}
