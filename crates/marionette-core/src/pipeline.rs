//! Chat Pipeline - prompt, parse, execute
//!
//! One provider call per instruction. A provider or parse failure aborts the
//! whole instruction before anything runs; once intents exist, each one gets
//! exactly one result.

use crate::config_store::ConfigStore;
use crate::error::Result;
use crate::log_sink::{LogLevel, LogSink};
use crate::parser::parse_instruction;
use marionette_llm::{build_provider, complete_prompt, LlmProvider, ProviderConfig};
use marionette_tools::{ActionResult, ActionRunner, ActionStatus, Intent};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Longest action output echoed into the activity log
const MAX_LOGGED_OUTPUT: usize = 200;

/// Outcome of one chat instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResult {
    /// `ok` once intents were produced, `error` if the instruction aborted
    pub status: ActionStatus,
    /// Summary label from the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    /// One result per intent, in order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<ActionResult>>,
    /// Failure description for an aborted instruction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ChatResult {
    /// Instruction ran (individual actions may still have failed)
    #[must_use]
    pub fn completed(intent: impl Into<String>, results: Vec<ActionResult>) -> Self {
        Self {
            status: ActionStatus::Ok,
            intent: Some(intent.into()),
            results: Some(results),
            message: None,
        }
    }

    /// Instruction aborted before execution
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: ActionStatus::Error,
            intent: None,
            results: None,
            message: Some(message.into()),
        }
    }
}

/// Builds a provider from the live configuration
pub trait ProviderFactory: Send + Sync {
    /// Build a provider for `config`
    ///
    /// # Errors
    /// Returns a provider error if the configuration cannot be used.
    fn build(&self, config: &ProviderConfig) -> marionette_llm::Result<Arc<dyn LlmProvider>>;
}

/// Factory backed by [`build_provider`]
#[derive(Debug, Clone)]
pub struct HttpProviderFactory {
    timeout: Duration,
}

impl HttpProviderFactory {
    /// Create a factory with a request timeout
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for HttpProviderFactory {
    fn default() -> Self {
        Self::new(marionette_llm::DEFAULT_TIMEOUT)
    }
}

impl ProviderFactory for HttpProviderFactory {
    fn build(&self, config: &ProviderConfig) -> marionette_llm::Result<Arc<dyn LlmProvider>> {
        build_provider(config, self.timeout)
    }
}

/// Natural-language instruction path
pub struct ChatPipeline {
    config_store: Arc<ConfigStore>,
    factory: Arc<dyn ProviderFactory>,
    system_prompt: String,
    runner: Arc<ActionRunner>,
    log: Arc<LogSink>,
}

impl ChatPipeline {
    /// Create a pipeline
    #[must_use]
    pub fn new(
        config_store: Arc<ConfigStore>,
        factory: Arc<dyn ProviderFactory>,
        system_prompt: impl Into<String>,
        runner: Arc<ActionRunner>,
        log: Arc<LogSink>,
    ) -> Self {
        Self {
            config_store,
            factory,
            system_prompt: system_prompt.into(),
            runner,
            log,
        }
    }

    /// Swap the provider factory
    #[must_use]
    pub fn with_factory(mut self, factory: Arc<dyn ProviderFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// The rendered system prompt
    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Run one instruction end to end
    #[instrument(skip(self, prompt))]
    pub async fn run(&self, prompt: &str) -> ChatResult {
        let (intent, intents) = match self.plan(prompt).await {
            Ok(planned) => planned,
            Err(e) => {
                warn!(error = %e, "Instruction aborted");
                self.log.append(LogLevel::Error, e.to_string());
                return ChatResult::failed(e.to_string());
            }
        };

        self.log.append(LogLevel::Ai, &intent);
        info!(intent = %intent, steps = intents.len(), "Executing plan");

        let mut results = Vec::with_capacity(intents.len());
        for step in &intents {
            let result = self.runner.execute(step).await;
            log_action(&self.log, step, &result);
            results.push(result);
        }

        ChatResult::completed(intent, results)
    }

    async fn plan(&self, prompt: &str) -> Result<(String, Vec<Intent>)> {
        let config = self.config_store.get();
        let provider = self.factory.build(&config)?;
        let raw = complete_prompt(provider.as_ref(), &self.system_prompt, prompt).await?;
        let parsed = parse_instruction(&raw)?;
        Ok((parsed.intent, parsed.intents))
    }
}

/// Log one action outcome as `ACTION: <type> | params=<json> | <status>: <detail>`
pub(crate) fn log_action(log: &LogSink, intent: &Intent, result: &ActionResult) {
    let params = Value::Object(intent.params.clone());
    let detail = match (&result.message, &result.output) {
        (Some(message), _) => message.clone(),
        (None, Some(output)) => summarize_output(output),
        (None, None) => String::new(),
    };
    let line = format!(
        "ACTION: {} | params={} | {}: {}",
        intent.action_type,
        params,
        result.status.as_str().to_ascii_uppercase(),
        detail
    );
    let level = if result.is_ok() {
        LogLevel::Ok
    } else {
        LogLevel::Error
    };
    log.append(level, line);
}

fn summarize_output(output: &Value) -> String {
    if let Some(message) = output.get("message").and_then(Value::as_str) {
        return message.to_string();
    }
    let text = match output {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.chars().count() > MAX_LOGGED_OUTPUT {
        let cut: String = text.chars().take(MAX_LOGGED_OUTPUT).collect();
        format!("{cut}...")
    } else {
        text
    }
}
