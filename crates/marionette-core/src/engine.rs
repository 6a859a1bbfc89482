//! Engine - the dispatch point for every instruction
//!
//! Owns the log, the provider configuration and the action runner. All
//! dispatch goes through one async guard, so only one instruction or direct
//! action is in flight at a time and log order follows dispatch order.

use crate::config_store::{ConfigPersister, ConfigStore};
use crate::error::{Error, Result};
use crate::log_sink::{LogLevel, LogSink};
use crate::pipeline::{log_action, ChatPipeline, ChatResult, HttpProviderFactory, ProviderFactory};
use crate::prompt::PromptTemplate;
use crate::router::{CommandRouter, Route, DEFAULT_SHELL_ESCAPE};
use crate::terminal::{TerminalConfig, TerminalExecutor, TerminalOutput};
use marionette_llm::{ProviderConfig, ProviderSettings};
use marionette_tools::{ActionRegistry, ActionResult, ActionRunner, Intent};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

/// Engine settings
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Leading character that routes input to the shell
    pub shell_escape: char,
    /// Shell settings
    pub terminal: TerminalConfig,
    /// Provider request timeout
    pub provider_timeout: Duration,
    /// Instruction template
    pub prompt: PromptTemplate,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            shell_escape: DEFAULT_SHELL_ESCAPE,
            terminal: TerminalConfig::default(),
            provider_timeout: marionette_llm::DEFAULT_TIMEOUT,
            prompt: PromptTemplate::default(),
        }
    }
}

/// Response to a submitted instruction
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SubmitResponse {
    /// Shell-escaped command
    Terminal(TerminalOutput),
    /// Natural-language instruction
    Chat(ChatResult),
}

/// Marionette engine
pub struct Engine {
    log: Arc<LogSink>,
    config_store: Arc<ConfigStore>,
    runner: Arc<ActionRunner>,
    router: CommandRouter,
    terminal: TerminalExecutor,
    pipeline: ChatPipeline,
    persister: Option<Arc<dyn ConfigPersister>>,
    dispatch: Mutex<()>,
}

impl Engine {
    /// Create an engine
    #[must_use]
    pub fn new(
        runner: ActionRunner,
        config: EngineConfig,
        log: Arc<LogSink>,
        config_store: Arc<ConfigStore>,
    ) -> Self {
        let runner = Arc::new(runner);
        let system_prompt = config.prompt.render(runner.registry());
        let pipeline = ChatPipeline::new(
            config_store.clone(),
            Arc::new(HttpProviderFactory::new(config.provider_timeout)),
            system_prompt,
            runner.clone(),
            log.clone(),
        );

        Self {
            router: CommandRouter::new(config.shell_escape),
            terminal: TerminalExecutor::new(config.terminal, log.clone()),
            log,
            config_store,
            runner,
            pipeline,
            persister: None,
            dispatch: Mutex::new(()),
        }
    }

    /// Replace the provider factory
    #[must_use]
    pub fn with_provider_factory(mut self, factory: Arc<dyn ProviderFactory>) -> Self {
        self.pipeline = self.pipeline.with_factory(factory);
        self
    }

    /// Save every accepted provider update through `persister`
    #[must_use]
    pub fn with_config_persister(mut self, persister: Arc<dyn ConfigPersister>) -> Self {
        self.persister = Some(persister);
        self
    }

    /// Route and run one line of input
    ///
    /// # Errors
    /// Returns [`Error::EmptyInput`] for blank input; nothing is logged.
    #[instrument(skip(self, text))]
    pub async fn submit(&self, text: &str) -> Result<SubmitResponse> {
        let route = self.router.route(text)?;
        let _guard = self.dispatch.lock().await;
        self.log.append(LogLevel::User, text.trim());

        Ok(match route {
            Route::Shell(command) => SubmitResponse::Terminal(self.terminal.run(&command).await),
            Route::Chat(prompt) => SubmitResponse::Chat(self.pipeline.run(&prompt).await),
        })
    }

    /// Run a natural-language instruction, bypassing the router
    ///
    /// # Errors
    /// Returns [`Error::EmptyInput`] for a blank prompt.
    pub async fn chat(&self, prompt: &str) -> Result<ChatResult> {
        let prompt = non_blank(prompt)?;
        let _guard = self.dispatch.lock().await;
        self.log.append(LogLevel::User, prompt);
        Ok(self.pipeline.run(prompt).await)
    }

    /// Run a raw shell command, bypassing the router
    ///
    /// # Errors
    /// Returns [`Error::EmptyInput`] for a blank command.
    pub async fn terminal(&self, command: &str) -> Result<TerminalOutput> {
        let command = non_blank(command)?;
        let _guard = self.dispatch.lock().await;
        self.log.append(
            LogLevel::User,
            format!("{}{command}", self.router.shell_escape()),
        );
        Ok(self.terminal.run(command).await)
    }

    /// Execute one action directly
    pub async fn execute_action(&self, intent: &Intent) -> ActionResult {
        let _guard = self.dispatch.lock().await;
        let result = self.runner.execute(intent).await;
        log_action(&self.log, intent, &result);
        result
    }

    /// Execute a batch of actions directly, in order
    pub async fn execute_batch(&self, intents: &[Intent]) -> Vec<ActionResult> {
        let _guard = self.dispatch.lock().await;
        let mut results = Vec::with_capacity(intents.len());
        for intent in intents {
            let result = self.runner.execute(intent).await;
            log_action(&self.log, intent, &result);
            results.push(result);
        }
        results
    }

    /// Replace the provider configuration
    ///
    /// # Errors
    /// Returns [`Error::Config`] when the settings are rejected; the previous
    /// configuration stays active. A failed save is logged, the update stands.
    pub async fn update_config(&self, settings: ProviderSettings) -> Result<Arc<ProviderConfig>> {
        let _guard = self.dispatch.lock().await;
        match self.config_store.update(settings) {
            Ok(config) => {
                info!(provider = %config.provider, "Provider updated");
                self.log.append(
                    LogLevel::System,
                    format!("Provider configured: {} ({})", config.provider, config.model),
                );
                // Saved under the guard so the file follows commit order
                if let Some(persister) = &self.persister {
                    if let Err(e) = persister.save(&config) {
                        warn!(error = %e, "Failed to persist provider configuration");
                        self.log
                            .append(LogLevel::Error, format!("Failed to save provider config: {e}"));
                    }
                }
                Ok(config)
            }
            Err(e) => {
                self.log.append(LogLevel::Error, e.to_string());
                Err(e)
            }
        }
    }

    /// The live provider configuration
    #[must_use]
    pub fn provider_config(&self) -> Arc<ProviderConfig> {
        self.config_store.get()
    }

    /// Rendered log lines; `None` returns everything
    #[must_use]
    pub fn logs(&self, limit: Option<usize>) -> Vec<String> {
        self.log.lines(limit)
    }

    /// The activity log
    #[must_use]
    pub fn log(&self) -> &Arc<LogSink> {
        &self.log
    }

    /// The action catalog
    #[must_use]
    pub fn registry(&self) -> &ActionRegistry {
        self.runner.registry()
    }

    /// The rendered system prompt
    #[must_use]
    pub fn system_prompt(&self) -> &str {
        self.pipeline.system_prompt()
    }
}

fn non_blank(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(Error::EmptyInput)
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests;
