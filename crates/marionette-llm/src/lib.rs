//! Marionette LLM - Provider Abstraction
//!
//! This crate turns a [`ProviderConfig`] and a prompt into one raw completion
//! string, whatever backend sits behind it:
//! - OpenAI-compatible chat APIs: OpenAI, DeepSeek, local servers, custom HTTP endpoints
//! - Anthropic: Messages API
//! - Gemini: generateContent API
//! - Mock: canned payloads for tests and offline use
//!
//! Every failure mode (transport, timeout, auth, malformed response) collapses
//! into the single [`Error`] type.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod completion;
pub mod config;
pub mod error;
pub mod message;
pub mod provider;
pub mod providers;
mod transport;
pub mod util;

pub use completion::{CompletionRequest, CompletionResponse, TokenUsage};
pub use config::{AuthScheme, ProviderConfig, ProviderKind, ProviderSettings, RequestShape};
pub use error::{Error, Result};
pub use message::{Message, MessageRole};
pub use provider::{build_provider, complete_prompt, LlmProvider, DEFAULT_TIMEOUT};
pub use providers::{
    AnthropicConfig, AnthropicProvider, GeminiConfig, GeminiProvider, MockProvider, OpenAiConfig,
    OpenAiProvider, MOCK_PAYLOAD,
};
