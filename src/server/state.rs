//! Provider configuration persistence
//!
//! The last accepted `POST /config` is written as JSON and restored at
//! startup. The in-memory record stays authoritative: a failed write is
//! reported, never rolled back.

use anyhow::{Context, Result};
use marionette_core::ConfigPersister;
use marionette_llm::{ProviderConfig, ProviderSettings};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Persists accepted provider updates to a JSON file
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigPersister for StateFile {
    fn save(&self, config: &ProviderConfig) -> marionette_core::Result<()> {
        save_provider_state(&self.path, config)
            .map_err(|e| marionette_core::Error::Persist(format!("{e:#}")))
    }
}

/// Load a saved provider configuration, if present
pub fn load_provider_state(path: &Path) -> Result<Option<ProviderConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let settings: ProviderSettings = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    let config = settings
        .normalize()
        .with_context(|| format!("Invalid provider config in {}", path.display()))?;
    debug!(path = %path.display(), provider = %config.provider, "Restored provider config");
    Ok(Some(config))
}

/// Save a provider configuration
pub fn save_provider_state(path: &Path, config: &ProviderConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }
    let content =
        serde_json::to_string_pretty(&config.to_settings()).context("Failed to serialize")?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
