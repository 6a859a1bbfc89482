//! Provider configuration
//!
//! [`ProviderSettings`] is the loose shape a UI or config file submits;
//! [`ProviderSettings::normalize`] turns it into a complete [`ProviderConfig`]
//! with every default filled in, or rejects it.

use crate::error::{Error, Result};
use crate::util::mask_api_key;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported provider backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI chat completions
    OpenAi,
    /// Google Gemini generateContent
    Gemini,
    /// Anthropic Messages API
    Anthropic,
    /// Local OpenAI-compatible server (Ollama, LM Studio, llama.cpp)
    Local,
    /// Any OpenAI-compatible HTTP endpoint
    Http,
    /// DeepSeek (OpenAI-compatible)
    DeepSeek,
    /// Canned responses, no network
    Mock,
}

/// How credentials are attached to a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// Key sent in a vendor-specific header
    Header(&'static str),
    /// Key sent as the `key` query parameter
    QueryKey,
    /// No credentials
    None,
}

/// Wire shape of the completion request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestShape {
    /// `POST {base}/chat/completions` with a `messages` array
    ChatCompletions,
    /// `POST {base}/v1/messages` with a top-level `system`
    Messages,
    /// `POST {base}/models/{model}:generateContent`
    GenerateContent,
    /// No request is sent
    Canned,
}

impl ProviderKind {
    /// All provider kinds
    pub const ALL: [ProviderKind; 7] = [
        Self::OpenAi,
        Self::Gemini,
        Self::Anthropic,
        Self::Local,
        Self::Http,
        Self::DeepSeek,
        Self::Mock,
    ];

    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
            Self::Anthropic => "anthropic",
            Self::Local => "local",
            Self::Http => "http",
            Self::DeepSeek => "deepseek",
            Self::Mock => "mock",
        }
    }

    /// Base URL used when the configuration does not override it
    #[must_use]
    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("https://api.openai.com/v1"),
            Self::Gemini => Some("https://generativelanguage.googleapis.com/v1beta"),
            Self::Anthropic => Some("https://api.anthropic.com"),
            Self::Local => Some("http://localhost:11434/v1"),
            Self::DeepSeek => Some("https://api.deepseek.com/v1"),
            Self::Http | Self::Mock => None,
        }
    }

    /// Model used when the configuration leaves it empty
    #[must_use]
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o",
            Self::Gemini => "gemini-1.5-flash",
            Self::Anthropic => "claude-3-5-sonnet-20241022",
            Self::Local => "llama3.2",
            Self::Http => "default",
            Self::DeepSeek => "deepseek-chat",
            Self::Mock => "mock",
        }
    }

    /// Credential placement for this provider, given whether a key is set
    #[must_use]
    pub fn auth_scheme(&self, has_key: bool) -> AuthScheme {
        match self {
            Self::OpenAi | Self::DeepSeek => AuthScheme::Bearer,
            Self::Anthropic => AuthScheme::Header("x-api-key"),
            Self::Gemini => AuthScheme::QueryKey,
            Self::Local | Self::Http if has_key => AuthScheme::Bearer,
            Self::Local | Self::Http | Self::Mock => AuthScheme::None,
        }
    }

    /// Request shape for this provider
    #[must_use]
    pub fn request_shape(&self) -> RequestShape {
        match self {
            Self::OpenAi | Self::Local | Self::Http | Self::DeepSeek => {
                RequestShape::ChatCompletions
            }
            Self::Anthropic => RequestShape::Messages,
            Self::Gemini => RequestShape::GenerateContent,
            Self::Mock => RequestShape::Canned,
        }
    }

    /// Whether the hosted API refuses requests without a key
    #[must_use]
    pub fn requires_api_key(&self) -> bool {
        matches!(
            self,
            Self::OpenAi | Self::Gemini | Self::Anthropic | Self::DeepSeek
        )
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lower)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(ProviderKind::as_str).collect();
                Error::InvalidConfig(format!(
                    "unknown provider '{}' (expected one of: {})",
                    s.trim(),
                    valid.join(", ")
                ))
            })
    }
}

/// Provider settings as submitted, before normalization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Provider name
    pub provider: String,
    /// API key (may be empty)
    #[serde(default, alias = "apiKey")]
    pub api_key: String,
    /// Model name (empty = provider default)
    #[serde(default)]
    pub model: String,
    /// Base URL override
    #[serde(default, alias = "baseUrl")]
    pub base_url: Option<String>,
}

impl ProviderSettings {
    /// Create settings for a provider name
    #[must_use]
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            ..Default::default()
        }
    }

    /// Set the API key
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = key.into();
        self
    }

    /// Set the model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Normalize into a complete configuration
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] for an unknown provider, an `http`
    /// provider without a base URL, or a base URL that is not http(s).
    pub fn normalize(self) -> Result<ProviderConfig> {
        let provider: ProviderKind = self.provider.parse()?;

        let base_url = self
            .base_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        if let Some(ref url) = base_url {
            let parsed = url::Url::parse(url)
                .map_err(|e| Error::InvalidConfig(format!("invalid base_url '{url}': {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(Error::InvalidConfig(format!(
                    "base_url must use http or https, got '{}'",
                    parsed.scheme()
                )));
            }
        } else if provider == ProviderKind::Http {
            return Err(Error::InvalidConfig(
                "provider 'http' requires a base_url".to_string(),
            ));
        }

        let model = match self.model.trim() {
            "" => provider.default_model().to_string(),
            model => model.to_string(),
        };

        Ok(ProviderConfig {
            provider,
            api_key: self.api_key.trim().to_string(),
            model,
            base_url,
        })
    }
}

/// Normalized provider configuration
///
/// Always complete: `model` is never empty and `base_url`, when present, has
/// been validated and stripped of trailing slashes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider backend
    pub provider: ProviderKind,
    /// API key (may be empty)
    #[serde(default)]
    pub api_key: String,
    /// Model name
    pub model: String,
    /// Base URL override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl ProviderConfig {
    /// The offline mock configuration
    #[must_use]
    pub fn mock() -> Self {
        Self {
            provider: ProviderKind::Mock,
            api_key: String::new(),
            model: ProviderKind::Mock.default_model().to_string(),
            base_url: None,
        }
    }

    /// Effective base URL: the override if set, the provider default otherwise
    #[must_use]
    pub fn resolved_base_url(&self) -> Option<String> {
        self.base_url
            .clone()
            .or_else(|| self.provider.default_base_url().map(str::to_string))
    }

    /// Effective credential placement
    #[must_use]
    pub fn auth_scheme(&self) -> AuthScheme {
        self.provider.auth_scheme(!self.api_key.is_empty())
    }

    /// Back to the loose form (for persistence)
    #[must_use]
    pub fn to_settings(&self) -> ProviderSettings {
        ProviderSettings {
            provider: self.provider.as_str().to_string(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            base_url: self.base_url.clone(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::mock()
    }
}

// SECURITY: Custom Debug implementation to mask API key
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("api_key", &mask_api_key(&self.api_key))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_roundtrip_names() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.as_str().parse::<ProviderKind>().unwrap(), kind);
        }
        assert_eq!(" OpenAI ".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert!("custom".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_auth_schemes() {
        assert_eq!(ProviderKind::OpenAi.auth_scheme(true), AuthScheme::Bearer);
        assert_eq!(ProviderKind::Gemini.auth_scheme(true), AuthScheme::QueryKey);
        assert_eq!(
            ProviderKind::Anthropic.auth_scheme(true),
            AuthScheme::Header("x-api-key")
        );
        assert_eq!(ProviderKind::Local.auth_scheme(false), AuthScheme::None);
        assert_eq!(ProviderKind::Local.auth_scheme(true), AuthScheme::Bearer);
        assert_eq!(ProviderKind::Mock.auth_scheme(true), AuthScheme::None);
    }

    #[test]
    fn test_normalize_fills_defaults() {
        let config = ProviderSettings::new("deepseek")
            .with_api_key("  sk-test  ")
            .normalize()
            .unwrap();

        assert_eq!(config.provider, ProviderKind::DeepSeek);
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.model, "deepseek-chat");
        assert!(config.base_url.is_none());
        assert_eq!(
            config.resolved_base_url().as_deref(),
            Some("https://api.deepseek.com/v1")
        );
    }

    #[test]
    fn test_normalize_base_url_override() {
        let config = ProviderSettings::new("openai")
            .with_base_url("http://127.0.0.1:8080/v1/")
            .normalize()
            .unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://127.0.0.1:8080/v1"));
        assert_eq!(
            config.resolved_base_url().as_deref(),
            Some("http://127.0.0.1:8080/v1")
        );

        let blank = ProviderSettings::new("openai")
            .with_base_url("   ")
            .normalize()
            .unwrap();
        assert!(blank.base_url.is_none());
    }

    #[test]
    fn test_normalize_rejects_invalid() {
        assert!(matches!(
            ProviderSettings::new("skynet").normalize(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            ProviderSettings::new("http").normalize(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            ProviderSettings::new("local")
                .with_base_url("ftp://example.com")
                .normalize(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(ProviderSettings::new("http")
            .with_base_url("http://localhost:9000")
            .normalize()
            .is_ok());
    }

    #[test]
    fn test_settings_accept_camel_case() {
        let settings: ProviderSettings = serde_json::from_str(
            r#"{"provider":"gemini","apiKey":"k","model":"","baseUrl":null}"#,
        )
        .unwrap();
        assert_eq!(settings.api_key, "k");
        assert_eq!(settings.normalize().unwrap().model, "gemini-1.5-flash");
    }

    #[test]
    fn test_config_debug_masks_key() {
        let config = ProviderSettings::new("openai")
            .with_api_key("sk-1234567890abcdefghijklmnop")
            .normalize()
            .unwrap();
        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("1234567890abcdefghijkl"));
    }
}
