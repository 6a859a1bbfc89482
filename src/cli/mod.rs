//! CLI module for Marionette
//!
//! - `serve`: start the HTTP server
//! - `submit`: run one instruction and print the JSON response
//! - `run`: execute actions directly from JSON
//! - `actions`: list the catalog
//! - `config show`: print the effective configuration

use crate::server::{build_engine, load_config};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use marionette_core::format_error_for_cli;
use marionette_tools::Intent;
use serde_json::Value;

/// Marionette CLI
#[derive(Parser, Debug)]
#[command(name = "marionette")]
#[command(about = "Natural-language desktop automation agent")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server
    Serve,
    /// Run one instruction (prefix with `!` for a shell command)
    Submit {
        /// Instruction text
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },
    /// Execute an action object or an {"actions": [...]} batch
    Run {
        /// JSON input
        json: String,
    },
    /// List available actions
    Actions,
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration (API key masked)
    Show,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Serve) => crate::server::run().await,
        Some(Commands::Submit { text }) => submit(&text.join(" ")).await,
        Some(Commands::Run { json }) => run_actions(&json).await,
        Some(Commands::Actions) => list_actions(),
        Some(Commands::Config {
            command: ConfigCommand::Show,
        }) => {
            let config = load_config()?;
            print!("{}", config.to_masked_toml()?);
            Ok(())
        }
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}

async fn submit(text: &str) -> Result<()> {
    let engine = build_engine(&load_config()?)?;
    match engine.submit(text).await {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Err(e) => bail!(format_error_for_cli(&e)),
    }
}

async fn run_actions(json: &str) -> Result<()> {
    let intents = parse_run_input(json)?;
    let engine = build_engine(&load_config()?)?;
    let results = engine.execute_batch(&intents).await;
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

fn list_actions() -> Result<()> {
    let engine = build_engine(&load_config()?)?;
    print!("{}", engine.registry().catalog_text());
    Ok(())
}

/// A single `{"type", "params"}` object or `{"actions": [...]}`
fn parse_run_input(json: &str) -> Result<Vec<Intent>> {
    let value: Value = serde_json::from_str(json).context("Invalid JSON")?;
    if let Some(actions) = value.get("actions") {
        return serde_json::from_value(actions.clone())
            .context("'actions' must be a list of {\"type\", \"params\"} objects");
    }
    let intent: Intent = serde_json::from_value(value)
        .context("Expected an action object with a 'type' field")?;
    Ok(vec![intent])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_action() {
        let intents = parse_run_input(r#"{"type":"mouse.move","params":{"x":1,"y":2}}"#).unwrap();
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].action_type, "mouse.move");
        assert_eq!(intents[0].params["y"], 2);
    }

    #[test]
    fn test_parse_batch() {
        let intents = parse_run_input(
            r#"{"actions":[{"type":"system.info"},{"type":"system.sleep","params":{"seconds":1}}]}"#,
        )
        .unwrap();
        let types: Vec<&str> = intents.iter().map(|i| i.action_type.as_str()).collect();
        assert_eq!(types, vec!["system.info", "system.sleep"]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_run_input("not json").is_err());
        assert!(parse_run_input(r#"{"params":{}}"#).is_err());
        assert!(parse_run_input(r#"{"actions":"system.info"}"#).is_err());
    }

    #[test]
    fn test_cli_parses_submit() {
        let cli = Cli::parse_from(["marionette", "submit", "open", "the", "notes"]);
        match cli.command {
            Some(Commands::Submit { text }) => assert_eq!(text.join(" "), "open the notes"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_cli_parses_config_show() {
        let cli = Cli::parse_from(["marionette", "config", "show"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                command: ConfigCommand::Show
            })
        ));
    }
}
