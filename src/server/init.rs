//! Server initialization and main run loop

use super::config::AppConfig;
use super::loader::load_config;
use super::state::{load_provider_state, StateFile};
use anyhow::{Context, Result};
use marionette_core::{ConfigStore, Engine, EngineConfig, LogLevel, LogSink, PromptTemplate};
use marionette_llm::ProviderConfig;
use marionette_tools::{
    register_builtins, ActionRegistry, ActionRunner, BuiltinsConfig, InputDriver,
    RecordingDriver, RunnerConfig, Workspace, XdotoolDriver,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub config: Arc<AppConfig>,
}

/// Assemble the engine described by `config`
pub fn build_engine(config: &AppConfig) -> Result<Engine> {
    let driver: Arc<dyn InputDriver> = match config.executor.driver.as_str() {
        "recording" => Arc::new(RecordingDriver::default()),
        _ => Arc::new(XdotoolDriver::new(&config.executor.input_program)),
    };
    let workspace = Workspace::new(&config.workspace.dir).with_context(|| {
        format!("Failed to prepare workspace '{}'", config.workspace.dir)
    })?;
    info!("Workspace: {}", workspace.root().display());

    let mut registry = ActionRegistry::new();
    register_builtins(
        &mut registry,
        &BuiltinsConfig {
            driver,
            workspace: Arc::new(workspace),
        },
    );
    let runner = ActionRunner::new(
        Arc::new(registry),
        RunnerConfig::default()
            .with_interval(Duration::from_millis(config.executor.action_interval_ms))
            .with_timeout(Duration::from_secs(config.executor.action_timeout_secs)),
    );

    let prompt = match config.llm.prompt_path() {
        Some(path) => PromptTemplate::from_file(&path)
            .with_context(|| format!("Failed to load prompt template {}", path.display()))?,
        None => PromptTemplate::default(),
    };
    let engine_config = EngineConfig {
        shell_escape: config.terminal.shell_escape_char()?,
        terminal: config.terminal.to_terminal_config()?,
        provider_timeout: Duration::from_secs(config.llm.timeout_secs),
        prompt,
    };

    let log = Arc::new(LogSink::new());
    let provider = initial_provider(config, &log)?;
    log.append(
        LogLevel::System,
        format!(
            "Marionette v{} ready (provider: {}, model: {})",
            env!("CARGO_PKG_VERSION"),
            provider.provider,
            provider.model
        ),
    );

    let engine = Engine::new(
        runner,
        engine_config,
        log,
        Arc::new(ConfigStore::new(provider)),
    );
    Ok(match config.llm.state_path() {
        Some(path) => engine.with_config_persister(Arc::new(StateFile::new(path))),
        None => engine,
    })
}

/// Saved provider config if there is a usable one, the `[llm]` section otherwise
fn initial_provider(config: &AppConfig, log: &LogSink) -> Result<ProviderConfig> {
    if let Some(path) = config.llm.state_path() {
        match load_provider_state(&path) {
            Ok(Some(saved)) => {
                info!(path = %path.display(), "Restored saved provider configuration");
                return Ok(saved);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "Ignoring saved provider configuration");
                log.append(LogLevel::Error, format!("Ignoring saved provider config: {e:#}"));
            }
        }
    }
    config
        .llm
        .settings()
        .normalize()
        .context("invalid [llm] section")
}

/// Build the HTTP application
pub fn build_app(state: AppState) -> axum::Router {
    crate::api::api_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Run the server
pub async fn run() -> Result<()> {
    info!("Starting Marionette v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config().context("Failed to load configuration")?;
    info!("Configuration loaded");

    let engine = build_engine(&config)?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState {
        engine: Arc::new(engine),
        config: Arc::new(config),
    };
    let app = build_app(state);

    info!("HTTP server listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Marionette shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::state::save_provider_state;
    use crate::server::test_config;
    use marionette_llm::{ProviderKind, ProviderSettings};

    #[test]
    fn test_build_engine_defaults_to_config_section() {
        let dir = tempfile::tempdir().unwrap();
        let engine = build_engine(&test_config(dir.path())).unwrap();
        assert_eq!(engine.provider_config().provider, ProviderKind::Mock);
        assert_eq!(engine.registry().len(), 17);
        assert!(dir.path().join("workspace").is_dir());
        assert!(engine.logs(None)[0].contains("ready"));
    }

    #[test]
    fn test_build_engine_restores_saved_provider() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let saved = ProviderSettings::new("local").normalize().unwrap();
        save_provider_state(&dir.path().join("llm_config.json"), &saved).unwrap();

        let engine = build_engine(&config).unwrap();
        assert_eq!(*engine.provider_config(), saved);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_state_file_holds_last_committed_update() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(build_engine(&test_config(dir.path())).unwrap());

        let tasks: Vec<_> = ["gpt-4o", "gpt-4o-mini", "o3-mini", "gpt-4.1"]
            .into_iter()
            .map(|model| {
                let engine = engine.clone();
                tokio::spawn(async move {
                    engine
                        .update_config(
                            ProviderSettings::new("openai")
                                .with_api_key("sk-race")
                                .with_model(model),
                        )
                        .await
                        .unwrap();
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let saved = load_provider_state(&dir.path().join("llm_config.json"))
            .unwrap()
            .unwrap();
        assert_eq!(saved, *engine.provider_config());
    }

    #[test]
    fn test_corrupt_state_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("llm_config.json"), "not json").unwrap();

        let engine = build_engine(&test_config(dir.path())).unwrap();
        assert_eq!(engine.provider_config().provider, ProviderKind::Mock);
        assert!(engine
            .logs(None)
            .iter()
            .any(|line| line.contains("| ERROR | Ignoring saved provider config")));
    }

    #[test]
    fn test_prompt_file_override() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        let prompt = dir.path().join("prompt.txt");
        std::fs::write(&prompt, "Only JSON.\n{actions}").unwrap();
        config.llm.prompt_file = prompt.display().to_string();

        let engine = build_engine(&config).unwrap();
        assert!(engine.system_prompt().starts_with("Only JSON.\n- file.delete"));

        config.llm.prompt_file = dir.path().join("missing.txt").display().to_string();
        assert!(build_engine(&config).is_err());
    }
}
