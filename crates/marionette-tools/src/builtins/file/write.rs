use super::not_found_or_io;
use super::workspace::Workspace;
use crate::error::{Error, Result};
use crate::registry::{opt_bool, req_str, Action, ActionCategory, ActionDefinition, ParamKind};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Write (or append) text to a workspace file
pub struct FileWriteAction {
    definition: ActionDefinition,
    workspace: Arc<Workspace>,
}

impl FileWriteAction {
    /// Create a new file write action
    #[must_use]
    pub fn new(workspace: Arc<Workspace>) -> Self {
        let definition = ActionDefinition::new(
            "file.write",
            "Write text to a file inside the workspace, creating parent directories; append=true appends",
        )
        .with_category(ActionCategory::File)
        .with_required("path", ParamKind::String)
        .with_required("content", ParamKind::String)
        .with_optional("append", ParamKind::Boolean);

        Self {
            definition,
            workspace,
        }
    }
}

#[async_trait::async_trait]
impl Action for FileWriteAction {
    fn definition(&self) -> &ActionDefinition {
        &self.definition
    }

    async fn execute(&self, params: &Map<String, Value>) -> Result<Value> {
        let path = req_str(params, "path")?;
        let content = req_str(params, "content")?;
        let append = opt_bool(params, "append")?.unwrap_or(false);

        let file_path = self.workspace.resolve(path)?;
        if file_path == self.workspace.root() {
            return Err(Error::InvalidInput("path must name a file".to_string()));
        }
        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        debug!(path = %file_path.display(), append, bytes = content.len(), "Writing file");
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(&file_path)
            .await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;

        Ok(json!({
            "path": self.workspace.display(&file_path),
            "bytes_written": content.len(),
            "append": append
        }))
    }
}

/// Delete a file or empty directory in the workspace
pub struct FileDeleteAction {
    definition: ActionDefinition,
    workspace: Arc<Workspace>,
}

impl FileDeleteAction {
    /// Create a new delete action
    #[must_use]
    pub fn new(workspace: Arc<Workspace>) -> Self {
        let definition = ActionDefinition::new(
            "file.delete",
            "Delete a file or empty directory inside the workspace",
        )
        .with_category(ActionCategory::File)
        .with_required("path", ParamKind::String);

        Self {
            definition,
            workspace,
        }
    }
}

#[async_trait::async_trait]
impl Action for FileDeleteAction {
    fn definition(&self) -> &ActionDefinition {
        &self.definition
    }

    async fn execute(&self, params: &Map<String, Value>) -> Result<Value> {
        let path = req_str(params, "path")?;
        let file_path = self.workspace.resolve(path)?;
        if file_path == self.workspace.root() {
            return Err(Error::PermissionDenied(
                "refusing to delete the workspace root".to_string(),
            ));
        }

        let metadata = tokio::fs::symlink_metadata(&file_path)
            .await
            .map_err(|e| not_found_or_io(e, || format!("file does not exist: {path}")))?;
        if metadata.is_dir() {
            tokio::fs::remove_dir(&file_path).await?;
        } else {
            tokio::fs::remove_file(&file_path).await?;
        }

        debug!(path = %file_path.display(), "Deleted");
        Ok(json!({"path": self.workspace.display(&file_path), "deleted": true}))
    }
}
