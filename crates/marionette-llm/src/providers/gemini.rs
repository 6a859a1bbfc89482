//! Gemini - generateContent provider

use crate::completion::{CompletionRequest, CompletionResponse, TokenUsage};
use crate::config::ProviderKind;
use crate::error::{Error, Result};
use crate::message::{split_system, MessageRole};
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
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<OwnedPart>,
}

#[derive(Debug, Serialize)]
struct OwnedPart {
    text: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Gemini provider configuration
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key (sent as the `key` query parameter)
    pub api_key: String,
    /// Base URL
    pub base_url: String,
    /// Default model
    pub default_model: String,
    /// Request timeout
    pub timeout: Duration,
}

// SECURITY: Custom Debug implementation to mask API key
impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &mask_api_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GeminiConfig {
    /// Create a new configuration with an API key
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        let kind = ProviderKind::Gemini;
        Self {
            api_key: api_key.into(),
            base_url: kind.default_base_url().unwrap_or_default().to_string(),
            default_model: kind.default_model().to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
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

/// Google Gemini provider
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = transport::build_client(config.timeout)?;
        Ok(Self { client, config })
    }
}

#[async_trait::async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
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

        let (system, turns) = split_system(&request.messages);
        let generation_config = GenerationConfig {
            max_output_tokens: request.max_tokens,
            temperature: request.temperature,
            response_mime_type: request.json_output.then_some("application/json"),
        };
        let has_generation_config = generation_config.max_output_tokens.is_some()
            || generation_config.temperature.is_some()
            || generation_config.response_mime_type.is_some();

        let body = GenerateRequest {
            contents: turns
                .into_iter()
                .map(|m| Content {
                    role: match m.role {
                        MessageRole::Assistant => "model",
                        _ => "user",
                    },
                    parts: vec![TextPart { text: &m.content }],
                })
                .collect(),
            system_instruction: system.map(|text| SystemInstruction {
                parts: vec![OwnedPart { text }],
            }),
            generation_config: has_generation_config.then_some(generation_config),
        };

        let url = format!("{}/models/{}:generateContent", self.config.base_url, model);
        debug!("Sending request to Gemini: {}", url);

        let http = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body);

        let response: GenerateResponse =
            transport::send_json(self.name(), http, self.config.timeout).await?;

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidResponse("No candidates in response".to_string()))?;

        let content = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|text| !text.is_empty())
            .ok_or_else(|| Error::InvalidResponse("Candidate has no text".to_string()))?;

        Ok(CompletionResponse {
            content,
            usage: response.usage_metadata.map(|u| TokenUsage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            }),
            finish_reason: candidate.finish_reason,
            model: response.model_version.unwrap_or_else(|| model.clone()),
        })
    }
}
