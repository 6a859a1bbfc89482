//! Error types for marionette-core
//!
//! This module provides error types and user-facing error formatting.

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Instruction was empty or whitespace
    #[error("empty instruction")]
    EmptyInput,

    /// Model output could not be turned into intents
    #[error("parse error: {0}")]
    Parse(String),

    /// Provider configuration rejected
    #[error("configuration error: {0}")]
    Config(String),

    /// LLM provider error
    #[error("llm error: {0}")]
    Llm(#[from] marionette_llm::Error),

    /// Action error
    #[error("action error: {0}")]
    Tool(#[from] marionette_tools::Error),

    /// Accepted configuration could not be written to durable storage
    #[error("persistence error: {0}")]
    Persist(String),

    /// IO error (prompt template, guide)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Human-readable messages and fix hints for the CLI and dashboard
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get a suggestion for how to fix the error
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for Error {
    fn user_message(&self) -> String {
        match self {
            Error::EmptyInput => "Nothing to do: the instruction is empty.".to_string(),
            Error::Parse(msg) => format!("The model reply could not be understood: {msg}"),
            Error::Config(msg) => format!("Provider configuration rejected: {msg}"),
            Error::Llm(marionette_llm::Error::Auth(_)) => {
                "The model provider rejected the API key.".to_string()
            }
            Error::Llm(marionette_llm::Error::Timeout(ms)) => {
                format!("The model provider did not answer within {ms}ms.")
            }
            Error::Llm(e) => format!("Model provider error: {e}"),
            Error::Tool(e) => format!("Action failed: {e}"),
            Error::Persist(msg) => format!("Provider configuration was applied but not saved: {msg}"),
            Error::Io(e) => format!("File error: {e}"),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Error::Llm(marionette_llm::Error::Auth(_))
            | Error::Llm(marionette_llm::Error::NotConfigured(_)) => Some(
                "Check the provider and API key via POST /config or MARIONETTE_LLM__API_KEY."
                    .to_string(),
            ),
            Error::Llm(marionette_llm::Error::Transport(_))
            | Error::Llm(marionette_llm::Error::Timeout(_)) => {
                Some("Check that the provider base URL is reachable.".to_string())
            }
            Error::Parse(_) => Some("Try rephrasing the instruction more concretely.".to_string()),
            Error::Config(_) => Some(
                "Valid providers: openai, gemini, anthropic, local, http, deepseek, mock. \
                 The http provider needs a base_url."
                    .to_string(),
            ),
            _ => None,
        }
    }
}

/// Format an error for display in the CLI
#[must_use]
pub fn format_error_for_cli(error: &Error) -> String {
    match error.suggestion() {
        Some(hint) => format!("{}\n\n{}", error.user_message(), hint),
        None => error.user_message(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_llm_error() {
        let err: Error = marionette_llm::Error::Auth("HTTP 401".to_string()).into();
        assert!(matches!(err, Error::Llm(_)));
        assert_eq!(err.user_message(), "The model provider rejected the API key.");
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn test_format_error_for_cli() {
        let formatted = format_error_for_cli(&Error::Parse("no JSON object".to_string()));
        assert!(formatted.contains("no JSON object"));
        assert!(formatted.contains("rephrasing"));

        assert_eq!(
            format_error_for_cli(&Error::EmptyInput),
            "Nothing to do: the instruction is empty."
        );
    }
}
