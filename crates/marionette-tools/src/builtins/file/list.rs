use super::not_found_or_io;
use super::workspace::Workspace;
use crate::error::Result;
use crate::registry::{opt_str, Action, ActionCategory, ActionDefinition, ParamKind};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// List a workspace directory
pub struct FileListAction {
    definition: ActionDefinition,
    workspace: Arc<Workspace>,
}

impl FileListAction {
    /// Create a new file list action
    #[must_use]
    pub fn new(workspace: Arc<Workspace>) -> Self {
        let definition = ActionDefinition::new(
            "file.list",
            "List a directory inside the workspace (default: workspace root)",
        )
        .with_category(ActionCategory::File)
        .with_optional("path", ParamKind::String);

        Self {
            definition,
            workspace,
        }
    }
}

#[async_trait::async_trait]
impl Action for FileListAction {
    fn definition(&self) -> &ActionDefinition {
        &self.definition
    }

    async fn execute(&self, params: &Map<String, Value>) -> Result<Value> {
        let path = opt_str(params, "path")?.unwrap_or(".");
        let dir = self.workspace.resolve(path)?;

        let mut reader = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| not_found_or_io(e, || format!("directory does not exist: {path}")))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let metadata = entry.metadata().await?;
            let kind = if metadata.is_dir() { "dir" } else { "file" };
            let size = if metadata.is_file() { metadata.len() } else { 0 };
            entries.push((entry.file_name().to_string_lossy().into_owned(), kind, size));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let entries: Vec<Value> = entries
            .into_iter()
            .map(|(name, kind, size)| json!({"name": name, "type": kind, "size": size}))
            .collect();

        Ok(json!({
            "path": self.workspace.display(&dir),
            "count": entries.len(),
            "entries": entries
        }))
    }
}
