//! Marionette - natural-language desktop automation agent
//!
//! CLI entry point for the Marionette server.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod cli;
mod server;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // Optional daily-rolling file log; the guard flushes it on exit
    let log_dir = server::load_config()
        .ok()
        .and_then(|config| config.logging.dir_path());
    let (file_layer, _guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "marionette.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marionette=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    let cli = cli::Cli::parse();
    if cli.command.is_some() {
        info!("Marionette v{}", env!("CARGO_PKG_VERSION"));
    }

    cli::run(cli).await
}
