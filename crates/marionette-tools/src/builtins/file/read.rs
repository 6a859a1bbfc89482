use super::not_found_or_io;
use super::workspace::Workspace;
use crate::error::{Error, Result};
use crate::registry::{req_str, Action, ActionCategory, ActionDefinition, ParamKind};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Largest file `file.read` returns
const MAX_READ_BYTES: u64 = 1_048_576;

/// Read a text file from the workspace
pub struct FileReadAction {
    definition: ActionDefinition,
    workspace: Arc<Workspace>,
}

impl FileReadAction {
    /// Create a new file read action
    #[must_use]
    pub fn new(workspace: Arc<Workspace>) -> Self {
        let definition =
            ActionDefinition::new("file.read", "Read a text file inside the workspace")
                .with_category(ActionCategory::File)
                .with_required("path", ParamKind::String);

        Self {
            definition,
            workspace,
        }
    }
}

#[async_trait::async_trait]
impl Action for FileReadAction {
    fn definition(&self) -> &ActionDefinition {
        &self.definition
    }

    async fn execute(&self, params: &Map<String, Value>) -> Result<Value> {
        let path = req_str(params, "path")?;
        let file_path = self.workspace.resolve(path)?;

        let metadata = tokio::fs::metadata(&file_path)
            .await
            .map_err(|e| not_found_or_io(e, || format!("file does not exist: {path}")))?;
        if !metadata.is_file() {
            return Err(Error::Execution(format!("not a file: {path}")));
        }
        if metadata.len() > MAX_READ_BYTES {
            return Err(Error::Execution(format!(
                "file is {} bytes, limit is {MAX_READ_BYTES}",
                metadata.len()
            )));
        }

        debug!(path = %file_path.display(), "Reading file");
        let bytes = tokio::fs::read(&file_path).await?;
        let content = String::from_utf8(bytes)
            .map_err(|_| Error::Execution(format!("file is not valid UTF-8: {path}")))?;

        Ok(json!({
            "path": self.workspace.display(&file_path),
            "size": content.len(),
            "content": content
        }))
    }
}

/// Check whether a path exists in the workspace
pub struct FileExistsAction {
    definition: ActionDefinition,
    workspace: Arc<Workspace>,
}

impl FileExistsAction {
    /// Create a new exists action
    #[must_use]
    pub fn new(workspace: Arc<Workspace>) -> Self {
        let definition =
            ActionDefinition::new("file.exists", "Check whether a path exists in the workspace")
                .with_category(ActionCategory::File)
                .with_required("path", ParamKind::String);

        Self {
            definition,
            workspace,
        }
    }
}

#[async_trait::async_trait]
impl Action for FileExistsAction {
    fn definition(&self) -> &ActionDefinition {
        &self.definition
    }

    async fn execute(&self, params: &Map<String, Value>) -> Result<Value> {
        let path = req_str(params, "path")?;
        let file_path = self.workspace.resolve(path)?;
        let exists = tokio::fs::try_exists(&file_path).await?;
        Ok(json!({"path": self.workspace.display(&file_path), "exists": exists}))
    }
}
