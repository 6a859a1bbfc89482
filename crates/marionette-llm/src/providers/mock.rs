//! Mock provider for offline use and testing

use crate::completion::{CompletionRequest, CompletionResponse};
use crate::error::{Error, Result};
use crate::provider::LlmProvider;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Payload returned when no scripted response is queued
pub const MOCK_PAYLOAD: &str =
    r#"{"intent":"Mock execution","actions":[{"type":"system.info","params":{}}]}"#;

/// Mock provider
///
/// Returns queued responses in order, then falls back to [`MOCK_PAYLOAD`].
/// Every request is recorded for inspection.
#[derive(Clone, Default)]
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<Result<String>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    /// Create a new mock provider
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response (builder form)
    #[must_use]
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.push_response(content);
        self
    }

    /// Queue a successful response
    pub fn push_response(&self, content: impl Into<String>) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Ok(content.into()));
    }

    /// Queue a failure
    pub fn push_error(&self, error: Error) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Err(error));
    }

    /// Requests received so far
    #[must_use]
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait::async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn default_model(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        let next = self
            .responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        let content = match next {
            Some(scripted) => scripted?,
            None => MOCK_PAYLOAD.to_string(),
        };

        Ok(CompletionResponse {
            content,
            usage: None,
            finish_reason: Some("stop".to_string()),
            model: "mock".to_string(),
        })
    }
}
