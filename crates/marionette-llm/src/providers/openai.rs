//! OpenAI-compatible chat completions
//!
//! Serves every provider that speaks `POST {base}/chat/completions`:
//! OpenAI, DeepSeek, local servers and arbitrary HTTP endpoints.

use crate::completion::{CompletionRequest, CompletionResponse, TokenUsage};
use crate::config::{AuthScheme, ProviderKind};
use crate::error::{Error, Result};
use crate::provider::{LlmProvider, DEFAULT_TIMEOUT};
use crate::transport;
use crate::util::mask_api_key;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Configuration for a chat-completions endpoint
#[derive(Clone)]
pub struct OpenAiConfig {
    /// Which provider this endpoint stands for
    pub kind: ProviderKind,
    /// API key (may be empty for local servers)
    pub api_key: String,
    /// Base URL, without trailing slash
    pub base_url: String,
    /// Default model
    pub default_model: String,
    /// Request timeout
    pub timeout: Duration,
}

// SECURITY: Custom Debug implementation to mask API key
impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("kind", &self.kind)
            .field("api_key", &mask_api_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiConfig {
    /// Create a configuration for `kind` at `base_url`
    #[must_use]
    pub fn new(kind: ProviderKind, base_url: impl Into<String>) -> Self {
        Self {
            kind,
            api_key: String::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            default_model: kind.default_model().to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the API key
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = key.into();
        self
    }

    /// Set the default model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Chat-completions provider
pub struct OpenAiProvider {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    /// Create a new provider
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = transport::build_client(config.timeout)?;
        Ok(Self { client, config })
    }

    /// Hosted OpenAI-family APIs honour `response_format`; local servers vary
    fn supports_json_mode(&self) -> bool {
        matches!(self.config.kind, ProviderKind::OpenAi | ProviderKind::DeepSeek)
    }
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        self.config.kind.as_str()
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let model = if request.model.is_empty() {
            &self.config.default_model
        } else {
            &request.model
        };

        let body = ChatRequest {
            model,
            messages: request
                .messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: (request.json_output && self.supports_json_mode())
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        let url = format!("{}/chat/completions", self.config.base_url);
        debug!("Sending request to {}: {}", self.name(), url);

        let mut http = self.client.post(&url).json(&body);
        if self.config.kind.auth_scheme(!self.config.api_key.is_empty()) == AuthScheme::Bearer {
            http = http.bearer_auth(&self.config.api_key);
        }

        let response: ChatResponse =
            transport::send_json(self.name(), http, self.config.timeout).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidResponse("No choices in response".to_string()))?;

        let content = choice
            .message
            .content
            .ok_or_else(|| Error::InvalidResponse("Empty message content".to_string()))?;

        Ok(CompletionResponse {
            content,
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason,
            model: response.model.unwrap_or_else(|| model.clone()),
        })
    }
}
