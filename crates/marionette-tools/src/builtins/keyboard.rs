//! Keyboard actions - type, press, hotkey

use crate::driver::InputDriver;
use crate::error::{Error, Result};
use crate::registry::{req_keys, req_str, Action, ActionCategory, ActionDefinition, ParamKind};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Type a string of text
pub struct KeyboardTypeAction {
    definition: ActionDefinition,
    driver: Arc<dyn InputDriver>,
}

impl KeyboardTypeAction {
    /// Create a new type action
    #[must_use]
    pub fn new(driver: Arc<dyn InputDriver>) -> Self {
        let definition = ActionDefinition::new("keyboard.type", "Type a string of text")
            .with_category(ActionCategory::Keyboard)
            .with_required("text", ParamKind::String)
            .paced();

        Self { definition, driver }
    }
}

#[async_trait::async_trait]
impl Action for KeyboardTypeAction {
    fn definition(&self) -> &ActionDefinition {
        &self.definition
    }

    async fn execute(&self, params: &Map<String, Value>) -> Result<Value> {
        let text = req_str(params, "text")?;
        self.driver.type_text(text).await?;
        let count = text.chars().count();
        Ok(json!({"characters": count, "message": format!("Typed {count} characters")}))
    }
}

/// Press and release one key
pub struct KeyboardPressAction {
    definition: ActionDefinition,
    driver: Arc<dyn InputDriver>,
}

impl KeyboardPressAction {
    /// Create a new press action
    #[must_use]
    pub fn new(driver: Arc<dyn InputDriver>) -> Self {
        let definition = ActionDefinition::new(
            "keyboard.press",
            "Press and release a single key (e.g. enter, tab, esc, a)",
        )
        .with_category(ActionCategory::Keyboard)
        .with_required("key", ParamKind::String)
        .paced();

        Self { definition, driver }
    }
}

#[async_trait::async_trait]
impl Action for KeyboardPressAction {
    fn definition(&self) -> &ActionDefinition {
        &self.definition
    }

    async fn execute(&self, params: &Map<String, Value>) -> Result<Value> {
        let key = req_str(params, "key")?.trim();
        if key.is_empty() {
            return Err(Error::InvalidInput("key must not be empty".to_string()));
        }
        self.driver.press_key(key).await?;
        Ok(json!({"key": key, "message": format!("Pressed '{key}'")}))
    }
}

/// Press a key combination
pub struct KeyboardHotkeyAction {
    definition: ActionDefinition,
    driver: Arc<dyn InputDriver>,
}

impl KeyboardHotkeyAction {
    /// Create a new hotkey action
    #[must_use]
    pub fn new(driver: Arc<dyn InputDriver>) -> Self {
        let definition = ActionDefinition::new(
            "keyboard.hotkey",
            "Press a key combination, keys as a list [\"ctrl\", \"c\"] or \"ctrl+c\"",
        )
        .with_category(ActionCategory::Keyboard)
        .with_required("keys", ParamKind::Keys)
        .paced();

        Self { definition, driver }
    }
}

#[async_trait::async_trait]
impl Action for KeyboardHotkeyAction {
    fn definition(&self) -> &ActionDefinition {
        &self.definition
    }

    async fn execute(&self, params: &Map<String, Value>) -> Result<Value> {
        let keys = req_keys(params, "keys")?;
        self.driver.hotkey(&keys).await?;
        Ok(json!({"keys": keys, "message": format!("Hotkey: {}", keys.join("+"))}))
    }
}
