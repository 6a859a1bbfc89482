//! Raw Terminal Executor - runs shell-escaped commands on the host

use crate::log_sink::{LogLevel, LogSink};
use marionette_tools::ActionStatus;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// Shell settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalConfig {
    /// Shell program
    pub shell: String,
    /// Arguments placed before the command string
    pub shell_args: Vec<String>,
    /// Working directory (process cwd when unset)
    pub working_dir: Option<PathBuf>,
    /// Level of the entry logged when the shell cannot be started
    pub spawn_failure_level: LogLevel,
    /// Upper bound on one command
    pub timeout: Duration,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        let (shell, shell_args) = if cfg!(windows) {
            ("powershell", vec!["-Command".to_string()])
        } else {
            ("sh", vec!["-c".to_string()])
        };
        Self {
            shell: shell.to_string(),
            shell_args,
            working_dir: None,
            spawn_failure_level: LogLevel::Error,
            timeout: Duration::from_secs(120),
        }
    }
}

impl TerminalConfig {
    /// Set the working directory
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set the shell and its leading arguments
    #[must_use]
    pub fn with_shell(mut self, shell: impl Into<String>, args: Vec<String>) -> Self {
        self.shell = shell.into();
        self.shell_args = args;
        self
    }

    /// Set the spawn-failure log level
    #[must_use]
    pub fn with_spawn_failure_level(mut self, level: LogLevel) -> Self {
        self.spawn_failure_level = level;
        self
    }

    /// Set the command timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Result of one shell command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalOutput {
    /// `ok` on exit code 0
    pub status: ActionStatus,
    /// Trimmed stdout, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Trimmed stderr, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Process exit code (absent when killed or never started)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Failure description when the command did not run to completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TerminalOutput {
    fn failed(message: String) -> Self {
        Self {
            status: ActionStatus::Error,
            output: None,
            error: None,
            exit_code: None,
            message: Some(message),
        }
    }
}

/// Runs commands through the configured shell and logs their output
pub struct TerminalExecutor {
    config: TerminalConfig,
    log: Arc<LogSink>,
}

impl TerminalExecutor {
    /// Create an executor
    #[must_use]
    pub fn new(config: TerminalConfig, log: Arc<LogSink>) -> Self {
        Self { config, log }
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    /// Run one command; never fails, failures are reported in the output
    #[instrument(skip(self))]
    pub async fn run(&self, command: &str) -> TerminalOutput {
        let mut cmd = Command::new(&self.config.shell);
        cmd.args(&self.config.shell_args)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(shell = %self.config.shell, error = %e, "Failed to spawn shell");
                let message = format!("failed to start {}: {e}", self.config.shell);
                self.log.append(self.config.spawn_failure_level, &message);
                return TerminalOutput::failed(message);
            }
        };

        let output = match tokio::time::timeout(self.config.timeout, child.wait_with_output()).await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                let message = format!("command failed: {e}");
                self.log.append(LogLevel::Error, &message);
                return TerminalOutput::failed(message);
            }
            Err(_) => {
                let message = format!(
                    "command timed out after {}ms",
                    self.config.timeout.as_millis()
                );
                self.log.append(LogLevel::Error, &message);
                return TerminalOutput::failed(message);
            }
        };

        let stdout = non_empty(&output.stdout);
        let stderr = non_empty(&output.stderr);
        if let Some(out) = &stdout {
            self.log.append(LogLevel::Terminal, out);
        }
        if let Some(err) = &stderr {
            self.log.append(LogLevel::Error, err);
        }

        let exit_code = output.status.code();
        debug!(?exit_code, "Command finished");

        TerminalOutput {
            status: if output.status.success() {
                ActionStatus::Ok
            } else {
                ActionStatus::Error
            },
            output: stdout,
            error: stderr,
            exit_code,
            message: None,
        }
    }
}

fn non_empty(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim_end();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn executor(config: TerminalConfig) -> (Arc<LogSink>, TerminalExecutor) {
        let log = Arc::new(LogSink::new());
        (log.clone(), TerminalExecutor::new(config, log))
    }

    #[tokio::test]
    async fn test_echo() {
        let (log, exec) = executor(TerminalConfig::default());
        let out = exec.run("echo hi").await;

        assert_eq!(out.status, ActionStatus::Ok);
        assert_eq!(out.output.as_deref(), Some("hi"));
        assert_eq!(out.error, None);
        assert_eq!(out.exit_code, Some(0));

        let entries = log.snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, LogLevel::Terminal);
        assert_eq!(entries[0].message, "hi");
    }

    #[tokio::test]
    async fn test_nonzero_exit_and_stderr() {
        let (log, exec) = executor(TerminalConfig::default());
        let out = exec.run("echo oops >&2; exit 3").await;

        assert_eq!(out.status, ActionStatus::Error);
        assert_eq!(out.output, None);
        assert_eq!(out.error.as_deref(), Some("oops"));
        assert_eq!(out.exit_code, Some(3));
        assert_eq!(log.snapshot()[0].level, LogLevel::Error);
    }

    #[tokio::test]
    async fn test_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "").unwrap();
        let (_log, exec) = executor(TerminalConfig::default().with_working_dir(dir.path()));

        let out = exec.run("ls").await;
        assert_eq!(out.output.as_deref(), Some("marker.txt"));
    }

    #[tokio::test]
    async fn test_spawn_failure_is_logged_at_configured_level() {
        let config = TerminalConfig::default()
            .with_shell("/nonexistent/shell", vec!["-c".to_string()])
            .with_spawn_failure_level(LogLevel::Terminal);
        let (log, exec) = executor(config);

        let out = exec.run("echo hi").await;
        assert_eq!(out.status, ActionStatus::Error);
        assert!(out.message.unwrap().contains("failed to start"));

        let entries = log.snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, LogLevel::Terminal);
    }

    #[tokio::test]
    async fn test_timeout() {
        let (_log, exec) =
            executor(TerminalConfig::default().with_timeout(Duration::from_millis(100)));
        let out = exec.run("sleep 5").await;
        assert_eq!(out.status, ActionStatus::Error);
        assert!(out.message.unwrap().contains("timed out"));
    }

    #[test]
    fn test_output_wire_shape() {
        let out = TerminalOutput {
            status: ActionStatus::Ok,
            output: Some("hi".to_string()),
            error: None,
            exit_code: Some(0),
            message: None,
        };
        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            serde_json::json!({"status": "ok", "output": "hi", "exit_code": 0})
        );
    }
}
