use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Sandbox root for file actions
///
/// Every path an action touches is resolved against the root and must stay
/// inside it, after `..` segments and symlinks are resolved.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Open (creating if needed) the workspace at `root`
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;
        let root = root.canonicalize()?;
        debug!(root = %root.display(), "Workspace ready");
        Ok(Self { root })
    }

    /// Canonical workspace root
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `path` inside the workspace
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        let joined = self.root.join(path.trim());
        let normalized = normalize(&joined);
        if !normalized.starts_with(&self.root) {
            warn!(path = %path, "Path escapes workspace");
            return Err(Error::PermissionDenied(format!(
                "'{path}' is outside the workspace"
            )));
        }

        let resolved = resolve_existing_prefix(&normalized)?;
        if !resolved.starts_with(&self.root) {
            warn!(path = %path, resolved = %resolved.display(), "Symlink escapes workspace");
            return Err(Error::PermissionDenied(format!(
                "'{path}' resolves outside the workspace"
            )));
        }
        Ok(resolved)
    }

    /// Path relative to the root, for display
    #[must_use]
    pub fn display(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
            Ok(rel) => rel.to_string_lossy().into_owned(),
            Err(_) => path.to_string_lossy().into_owned(),
        }
    }
}

/// Lexically remove `.` and `..` components
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalize the longest existing ancestor and re-append the rest
fn resolve_existing_prefix(path: &Path) -> Result<PathBuf> {
    for ancestor in path.ancestors() {
        if ancestor.exists() {
            let canonical = ancestor.canonicalize()?;
            let rest = path.strip_prefix(ancestor).unwrap_or_else(|_| Path::new(""));
            return Ok(if rest.as_os_str().is_empty() {
                canonical
            } else {
                canonical.join(rest)
            });
        }
    }
    Ok(path.to_path_buf())
}
