//! Provider trait and factory
//!
//! Every backend implements [`LlmProvider`]; [`build_provider`] picks the
//! implementation for a [`ProviderConfig`] by its request shape.

use crate::completion::{CompletionRequest, CompletionResponse};
use crate::config::{ProviderConfig, RequestShape};
use crate::error::{Error, Result};
use crate::message::Message;
use crate::providers::{
    AnthropicConfig, AnthropicProvider, GeminiConfig, GeminiProvider, MockProvider, OpenAiConfig,
    OpenAiProvider,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Default request timeout for network-backed providers
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Trait for language-model providers
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Get the default model
    fn default_model(&self) -> &str;

    /// Complete a conversation (text only)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;
}

/// Build the provider described by `config`
///
/// # Errors
/// Returns [`Error::NotConfigured`] when a hosted provider has no API key or
/// a provider has no usable base URL, and [`Error::Transport`] if the HTTP
/// client cannot be created.
pub fn build_provider(config: &ProviderConfig, timeout: Duration) -> Result<Arc<dyn LlmProvider>> {
    debug!(provider = %config.provider, model = %config.model, "Building provider");

    if config.provider.requires_api_key() && config.api_key.is_empty() {
        return Err(Error::NotConfigured(format!(
            "{} requires an API key",
            config.provider
        )));
    }

    let base_url = || {
        config.resolved_base_url().ok_or_else(|| {
            Error::NotConfigured(format!("{} has no base URL", config.provider))
        })
    };

    let provider: Arc<dyn LlmProvider> = match config.provider.request_shape() {
        RequestShape::ChatCompletions => Arc::new(OpenAiProvider::new(
            OpenAiConfig::new(config.provider, base_url()?)
                .with_api_key(config.api_key.clone())
                .with_model(config.model.clone())
                .with_timeout(timeout),
        )?),
        RequestShape::Messages => Arc::new(AnthropicProvider::new(
            AnthropicConfig::new(config.api_key.clone())
                .with_base_url(base_url()?)
                .with_model(config.model.clone())
                .with_timeout(timeout),
        )?),
        RequestShape::GenerateContent => Arc::new(GeminiProvider::new(
            GeminiConfig::new(config.api_key.clone())
                .with_base_url(base_url()?)
                .with_model(config.model.clone())
                .with_timeout(timeout),
        )?),
        RequestShape::Canned => Arc::new(MockProvider::new()),
    };

    Ok(provider)
}

/// Send one system + user exchange and return the raw completion text
///
/// # Errors
/// Propagates any provider failure unchanged.
#[instrument(skip(provider, system, prompt), fields(provider = provider.name()))]
pub async fn complete_prompt(
    provider: &dyn LlmProvider,
    system: &str,
    prompt: &str,
) -> Result<String> {
    let request = CompletionRequest::new(provider.default_model())
        .with_message(Message::system(system))
        .with_message(Message::user(prompt))
        .with_json_output();

    let response = provider.complete(request).await?;
    debug!(
        chars = response.content.len(),
        finish_reason = ?response.finish_reason,
        "Completion received"
    );
    Ok(response.content)
}
