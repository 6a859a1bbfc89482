//! Config Store - the single live provider configuration
//!
//! Updates are normalized into a complete record and swapped in whole; a
//! rejected update leaves the previous record active.

use crate::error::{Error, Result};
use marionette_llm::{ProviderConfig, ProviderSettings};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// Durable copy of the provider configuration
pub trait ConfigPersister: Send + Sync {
    /// Write `config`; called once per accepted update, in commit order
    fn save(&self, config: &ProviderConfig) -> Result<()>;
}

/// Holder of exactly one [`ProviderConfig`]
#[derive(Debug)]
pub struct ConfigStore {
    current: RwLock<Arc<ProviderConfig>>,
}

impl ConfigStore {
    /// Create a store holding `initial`
    #[must_use]
    pub fn new(initial: ProviderConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    /// The latest committed record
    #[must_use]
    pub fn get(&self) -> Arc<ProviderConfig> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Normalize `settings` and replace the live record
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the settings are rejected; the previous
    /// record stays active.
    pub fn update(&self, settings: ProviderSettings) -> Result<Arc<ProviderConfig>> {
        let config = settings.normalize().map_err(|e| {
            warn!(error = %e, "Provider configuration rejected");
            Error::Config(e.to_string())
        })?;
        Ok(self.replace(config))
    }

    /// Replace the live record with an already-normalized one
    pub fn replace(&self, config: ProviderConfig) -> Arc<ProviderConfig> {
        let config = Arc::new(config);
        info!(provider = %config.provider, model = %config.model, "Provider configured");
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = config.clone();
        config
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(ProviderConfig::mock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marionette_llm::ProviderKind;

    #[test]
    fn test_initial_is_mock() {
        let store = ConfigStore::default();
        assert_eq!(store.get().provider, ProviderKind::Mock);
    }

    #[test]
    fn test_update_replaces_whole_record() {
        let store = ConfigStore::default();
        store
            .update(
                ProviderSettings::new("openai")
                    .with_api_key("sk-one")
                    .with_model("gpt-4o-mini")
                    .with_base_url("https://proxy.example.com/v1/"),
            )
            .unwrap();

        // no field merge: the second update carries no base_url or model
        let config = store
            .update(ProviderSettings::new("openai").with_api_key("sk-two"))
            .unwrap();
        assert_eq!(config.api_key, "sk-two");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.base_url, None);
        assert_eq!(*store.get(), *config);
    }

    #[test]
    fn test_rejected_update_keeps_previous() {
        let store = ConfigStore::default();
        store
            .update(ProviderSettings::new("local").with_model("llama3.2"))
            .unwrap();

        for bad in [
            ProviderSettings::new("skynet"),
            ProviderSettings::new("http"),
            ProviderSettings::new("local").with_base_url("ftp://host"),
            ProviderSettings::new("local").with_base_url("not a url"),
        ] {
            let err = store.update(bad).unwrap_err();
            assert!(matches!(err, Error::Config(_)));
        }
        assert_eq!(store.get().provider, ProviderKind::Local);
    }

    #[test]
    fn test_concurrent_readers_see_whole_records() {
        let store = Arc::new(ConfigStore::default());
        let writer = {
            let store = store.clone();
            std::thread::spawn(move || {
                for i in 0..200 {
                    let (kind, key) = if i % 2 == 0 {
                        ("openai", "key-openai")
                    } else {
                        ("anthropic", "key-anthropic")
                    };
                    store
                        .update(ProviderSettings::new(kind).with_api_key(key))
                        .unwrap();
                }
            })
        };

        for _ in 0..500 {
            let config = store.get();
            match config.provider {
                ProviderKind::Mock => assert!(config.api_key.is_empty()),
                kind => assert_eq!(config.api_key, format!("key-{kind}")),
            }
        }
        writer.join().unwrap();
    }
}
