//! Marionette Core - instruction routing, parsing and dispatch
//!
//! This crate ties the provider and action layers together:
//! - Router: shell escape vs. natural-language instructions
//! - Parser: model output to ordered intents
//! - Pipeline: prompt, parse, execute
//! - Engine: the single serialized dispatch point
//! - LogSink / ConfigStore: explicitly owned shared state

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config_store;
pub mod engine;
pub mod error;
pub mod log_sink;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod router;
pub mod terminal;

pub use config_store::{ConfigPersister, ConfigStore};
pub use engine::{Engine, EngineConfig, SubmitResponse};
pub use error::{format_error_for_cli, Error, Result, UserFriendlyError};
pub use log_sink::{LogEntry, LogLevel, LogSink, TIMESTAMP_FORMAT};
pub use parser::{extract_json, parse_instruction, ParsedInstruction, DEFAULT_INTENT};
pub use pipeline::{ChatPipeline, ChatResult, HttpProviderFactory, ProviderFactory};
pub use prompt::{PromptTemplate, ACTIONS_PLACEHOLDER, DEFAULT_TEMPLATE};
pub use router::{CommandRouter, Route, DEFAULT_SHELL_ESCAPE};
pub use terminal::{TerminalConfig, TerminalExecutor, TerminalOutput};

// Re-exports for the binary
pub use marionette_llm;
pub use marionette_tools;
