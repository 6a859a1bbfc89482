//! Server configuration types
//!
//! Mirrors `config/default.toml`. Empty strings mean "unset" so every key can
//! be overridden from the environment.

use anyhow::{bail, Context, Result};
use marionette_core::{LogLevel, TerminalConfig};
use marionette_llm::ProviderSettings;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub terminal: TerminalAppConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub guide: GuideConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Reject settings that would only fail later at runtime
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("server.port must be non-zero");
        }
        self.terminal.shell_escape_char()?;
        self.terminal.failure_level()?;
        if !matches!(self.executor.driver.as_str(), "xdotool" | "recording") {
            bail!(
                "executor.driver must be 'xdotool' or 'recording', got '{}'",
                self.executor.driver
            );
        }
        self.llm
            .settings()
            .normalize()
            .context("invalid [llm] section")?;
        Ok(())
    }

    /// Render as TOML with the API key masked
    pub fn to_masked_toml(&self) -> Result<String> {
        let mut masked = self.clone();
        masked.llm.api_key = mask_api_key(&masked.llm.api_key);
        toml::to_string_pretty(&masked).context("Failed to serialize config")
    }
}

/// HTTP listener
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// File action sandbox
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    pub dir: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            dir: "workspace".to_string(),
        }
    }
}

/// Action executor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_action_interval_ms")]
    pub action_interval_ms: u64,
    #[serde(default = "default_action_timeout_secs")]
    pub action_timeout_secs: u64,
    /// `xdotool` drives the real display, `recording` only records
    #[serde(default = "default_driver")]
    pub driver: String,
    #[serde(default = "default_driver")]
    pub input_program: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            action_interval_ms: default_action_interval_ms(),
            action_timeout_secs: default_action_timeout_secs(),
            driver: default_driver(),
            input_program: default_driver(),
        }
    }
}

fn default_action_interval_ms() -> u64 {
    300
}

fn default_action_timeout_secs() -> u64 {
    30
}

fn default_driver() -> String {
    "xdotool".to_string()
}

/// Raw shell escape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalAppConfig {
    #[serde(default = "default_shell_escape")]
    pub shell_escape: String,
    #[serde(default)]
    pub shell: String,
    #[serde(default)]
    pub shell_args: Vec<String>,
    #[serde(default = "default_spawn_failure_level")]
    pub spawn_failure_level: String,
    #[serde(default)]
    pub working_dir: String,
    #[serde(default = "default_terminal_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TerminalAppConfig {
    fn default() -> Self {
        Self {
            shell_escape: default_shell_escape(),
            shell: String::new(),
            shell_args: Vec::new(),
            spawn_failure_level: default_spawn_failure_level(),
            working_dir: String::new(),
            timeout_secs: default_terminal_timeout_secs(),
        }
    }
}

fn default_shell_escape() -> String {
    "!".to_string()
}

fn default_spawn_failure_level() -> String {
    "error".to_string()
}

fn default_terminal_timeout_secs() -> u64 {
    120
}

impl TerminalAppConfig {
    /// The marker as a single character
    pub fn shell_escape_char(&self) -> Result<char> {
        let mut chars = self.shell_escape.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_whitespace() => Ok(c),
            _ => bail!(
                "terminal.shell_escape must be a single character, got '{}'",
                self.shell_escape
            ),
        }
    }

    /// Spawn-failure level; only `error` and `terminal` are accepted
    pub fn failure_level(&self) -> Result<LogLevel> {
        match self.spawn_failure_level.parse::<LogLevel>() {
            Ok(level @ (LogLevel::Error | LogLevel::Terminal)) => Ok(level),
            _ => bail!(
                "terminal.spawn_failure_level must be 'error' or 'terminal', got '{}'",
                self.spawn_failure_level
            ),
        }
    }

    /// Core terminal settings
    pub fn to_terminal_config(&self) -> Result<TerminalConfig> {
        let mut config = TerminalConfig::default()
            .with_spawn_failure_level(self.failure_level()?)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        if !self.shell.trim().is_empty() {
            let args = if self.shell_args.is_empty() {
                config.shell_args.clone()
            } else {
                self.shell_args.clone()
            };
            config = config.with_shell(self.shell.trim(), args);
        }
        if !self.working_dir.trim().is_empty() {
            config = config.with_working_dir(self.working_dir.trim());
        }
        Ok(config)
    }
}

/// Initial provider and provider-call settings
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub state_file: String,
    #[serde(default)]
    pub prompt_file: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: String::new(),
            model: String::new(),
            base_url: String::new(),
            timeout_secs: default_llm_timeout_secs(),
            state_file: String::new(),
            prompt_file: String::new(),
        }
    }
}

fn default_provider() -> String {
    "mock".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    60
}

impl LlmConfig {
    /// Provider settings described by this section
    pub fn settings(&self) -> ProviderSettings {
        let mut settings = ProviderSettings::new(&self.provider)
            .with_api_key(&self.api_key)
            .with_model(&self.model);
        if !self.base_url.trim().is_empty() {
            settings = settings.with_base_url(&self.base_url);
        }
        settings
    }

    /// Where accepted provider updates are saved
    pub fn state_path(&self) -> Option<PathBuf> {
        non_empty_path(&self.state_file)
    }

    /// Instruction template override
    pub fn prompt_path(&self) -> Option<PathBuf> {
        non_empty_path(&self.prompt_file)
    }
}

// SECURITY: Custom Debug implementation to mask API key
impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("api_key", &mask_api_key(&self.api_key))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("state_file", &self.state_file)
            .field("prompt_file", &self.prompt_file)
            .finish()
    }
}

/// Usage guide served at `/guide`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuideConfig {
    pub path: String,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            path: "docs/GUIDE.md".to_string(),
        }
    }
}

/// File logging
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub dir: String,
}

impl LoggingConfig {
    /// Directory for the rolling log file
    pub fn dir_path(&self) -> Option<PathBuf> {
        non_empty_path(&self.dir)
    }
}

fn non_empty_path(raw: &str) -> Option<PathBuf> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}

/// Mask a secret for display; an unset key stays empty
pub fn mask_api_key(key: &str) -> String {
    if key.is_empty() {
        String::new()
    } else {
        marionette_llm::util::mask_api_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn test_shell_escape_char() {
        let mut terminal = TerminalAppConfig::default();
        assert_eq!(terminal.shell_escape_char().unwrap(), '!');
        terminal.shell_escape = "$".to_string();
        assert_eq!(terminal.shell_escape_char().unwrap(), '$');
        for bad in ["", "!!", " "] {
            terminal.shell_escape = bad.to_string();
            assert!(terminal.shell_escape_char().is_err(), "{bad:?}");
        }
    }

    #[test]
    fn test_failure_level() {
        let mut terminal = TerminalAppConfig::default();
        assert_eq!(terminal.failure_level().unwrap(), LogLevel::Error);
        terminal.spawn_failure_level = "TERMINAL".to_string();
        assert_eq!(terminal.failure_level().unwrap(), LogLevel::Terminal);
        terminal.spawn_failure_level = "ai".to_string();
        assert!(terminal.failure_level().is_err());
    }

    #[test]
    fn test_terminal_overrides() {
        let terminal = TerminalAppConfig {
            shell: "bash".to_string(),
            working_dir: "/tmp".to_string(),
            ..Default::default()
        };
        let config = terminal.to_terminal_config().unwrap();
        assert_eq!(config.shell, "bash");
        assert_eq!(config.working_dir, Some(PathBuf::from("/tmp")));
        assert!(!config.shell_args.is_empty());
    }

    #[test]
    fn test_invalid_llm_section() {
        let mut config = AppConfig::default();
        config.llm.provider = "http".to_string();
        assert!(config.validate().is_err());
        config.llm.base_url = "http://localhost:9000/v1".to_string();
        config.validate().unwrap();
    }

    #[test]
    fn test_masked_output() {
        let mut config = AppConfig::default();
        config.llm.api_key = "sk-live-1234567890".to_string();
        let rendered = config.to_masked_toml().unwrap();
        assert!(rendered.contains("sk-l...7890"));
        assert!(!rendered.contains("1234567890"));
        assert!(!format!("{:?}", config.llm).contains("1234567890"));
        assert_eq!(mask_api_key("short"), "****");
        assert_eq!(mask_api_key(""), "");
    }
}
