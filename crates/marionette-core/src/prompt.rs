//! System prompt template for the chat pipeline

use crate::error::Result;
use marionette_tools::ActionRegistry;
use std::path::Path;

/// Placeholder replaced with the catalog listing
pub const ACTIONS_PLACEHOLDER: &str = "{actions}";

/// Compiled-in instruction template
pub const DEFAULT_TEMPLATE: &str = r#"You are Marionette, an automation engine running on the user's computer.
Translate the user's natural-language instruction into a sequence of concrete actions.

Available actions (name{params}: description, '?' marks optional params):
{actions}

Rules:
- Respond ONLY with a JSON object, no prose.
- The object has an "intent" (short description) and "actions" (list of action objects).
- Each action object has a "type" (e.g. "mouse.move") and "params" (object of arguments).
- Only use the actions listed above.
- Be precise with coordinates and paths. File paths are relative to the workspace.

Example response:
{
  "intent": "Create a greeting file",
  "actions": [
    {"type": "file.write", "params": {"path": "hello.txt", "content": "Hello from Marionette!"}}
  ]
}"#;

/// Instruction template with an `{actions}` slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Wrap a template string
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Load a template override from disk
    ///
    /// # Errors
    /// Returns [`crate::Error::Io`] if the file cannot be read.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(std::fs::read_to_string(path)?))
    }

    /// The raw template text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Fill in the catalog listing
    #[must_use]
    pub fn render(&self, registry: &ActionRegistry) -> String {
        self.template
            .replace(ACTIONS_PLACEHOLDER, &registry.catalog_text())
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marionette_tools::{register_builtins, BuiltinsConfig, RecordingDriver, Workspace};
    use std::sync::Arc;

    #[test]
    fn test_render_lists_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = ActionRegistry::new();
        register_builtins(
            &mut registry,
            &BuiltinsConfig {
                driver: Arc::new(RecordingDriver::default()),
                workspace: Arc::new(Workspace::new(dir.path()).unwrap()),
            },
        );

        let prompt = PromptTemplate::default().render(&registry);
        assert!(!prompt.contains(ACTIONS_PLACEHOLDER));
        assert!(prompt.contains("- mouse.move{x:integer, y:integer, duration?:number}"));
        assert!(prompt.contains("system.info"));
        assert!(prompt.contains("\"intent\""));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.txt");
        std::fs::write(&path, "Actions:\n{actions}\nJSON only.").unwrap();

        let template = PromptTemplate::from_file(&path).unwrap();
        let rendered = template.render(&ActionRegistry::new());
        assert_eq!(rendered, "Actions:\n\nJSON only.");

        assert!(PromptTemplate::from_file(dir.path().join("missing.txt")).is_err());
    }
}
