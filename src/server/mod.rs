//! Server module for Marionette
//!
//! # Module Structure
//!
//! - `config`: Configuration structures
//! - `loader`: Configuration loading from files and environment
//! - `state`: Provider configuration persistence
//! - `init`: Engine assembly and the HTTP run loop

pub mod config;
mod init;
mod loader;
pub mod state;

pub use init::{build_app, build_engine, run, AppState};
pub use loader::load_config;

/// Isolated config for tests: recording driver, no pacing, temp paths
#[cfg(test)]
pub(crate) fn test_config(dir: &std::path::Path) -> config::AppConfig {
    let mut config = config::AppConfig::default();
    config.workspace.dir = dir.join("workspace").display().to_string();
    config.executor.driver = "recording".to_string();
    config.executor.action_interval_ms = 0;
    config.llm.state_file = dir.join("llm_config.json").display().to_string();
    config.guide.path = dir.join("GUIDE.md").display().to_string();
    config
}
