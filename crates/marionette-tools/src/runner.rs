//! Runner - Action execution engine
//!
//! Executes intents strictly in order. Each intent is isolated: a handler
//! error, timeout or panic becomes an error result for that intent only and
//! the batch carries on.

use crate::error::{Error, Result};
use crate::intent::{ActionResult, Intent};
use crate::registry::{Action, ActionRegistry};
use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, error, instrument, warn};

/// Message for an action type missing from the catalog
pub const UNKNOWN_ACTION: &str = "unknown action";

/// Configuration for the action runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Upper bound on one handler run
    pub action_timeout: Duration,
    /// Pause after every paced (input) action
    pub action_interval: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            action_timeout: Duration::from_secs(30),
            action_interval: Duration::from_millis(300),
        }
    }
}

impl RunnerConfig {
    /// Set the per-action timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.action_timeout = timeout;
        self
    }

    /// Set the pause after input actions
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.action_interval = interval;
        self
    }
}

/// Sequential executor over an [`ActionRegistry`]
pub struct ActionRunner {
    registry: Arc<ActionRegistry>,
    config: RunnerConfig,
}

impl ActionRunner {
    /// Create a new runner
    #[must_use]
    pub fn new(registry: Arc<ActionRegistry>, config: RunnerConfig) -> Self {
        Self { registry, config }
    }

    /// Create with default configuration
    #[must_use]
    pub fn with_defaults(registry: Arc<ActionRegistry>) -> Self {
        Self::new(registry, RunnerConfig::default())
    }

    /// Get the registry
    #[must_use]
    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Execute one intent; never fails, failures become error results
    #[instrument(skip(self, intent), fields(action = %intent.action_type))]
    pub async fn execute(&self, intent: &Intent) -> ActionResult {
        let Some(action) = self.registry.get(&intent.action_type) else {
            warn!(action = %intent.action_type, "Unknown action");
            return ActionResult::error(&intent.action_type, UNKNOWN_ACTION);
        };

        let start = Instant::now();
        let outcome = self.run_isolated(action.as_ref(), intent).await;
        let duration_ms = start.elapsed().as_millis();

        if action.definition().paced && !self.config.action_interval.is_zero() {
            tokio::time::sleep(self.config.action_interval).await;
        }

        match outcome {
            Ok(output) => {
                debug!(action = %intent.action_type, duration_ms, "Action completed");
                ActionResult::ok(&intent.action_type, output)
            }
            Err(e) => {
                error!(action = %intent.action_type, error = %e, duration_ms, "Action failed");
                ActionResult::error(&intent.action_type, e.to_string())
            }
        }
    }

    /// Execute intents in order; one result per intent, same order
    pub async fn execute_batch(&self, intents: &[Intent]) -> Vec<ActionResult> {
        let mut results = Vec::with_capacity(intents.len());
        for intent in intents {
            results.push(self.execute(intent).await);
        }
        results
    }

    async fn run_isolated(&self, action: &dyn Action, intent: &Intent) -> Result<Value> {
        action.validate_params(&intent.params)?;

        let limit = action
            .definition()
            .min_timeout
            .map_or(self.config.action_timeout, |t| t.max(self.config.action_timeout));
        let guarded = AssertUnwindSafe(action.execute(&intent.params)).catch_unwind();

        match timeout(limit, guarded).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => Err(Error::Execution(format!(
                "handler panicked: {}",
                panic_message(panic.as_ref())
            ))),
            Err(_) => {
                warn!(action = %intent.action_type, timeout_ms = %limit.as_millis(), "Action timed out");
                Err(Error::Timeout(
                    u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                ))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
