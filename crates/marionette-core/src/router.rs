//! Command Router - shell escape vs. chat

use crate::error::{Error, Result};

/// Default shell-escape marker
pub const DEFAULT_SHELL_ESCAPE: char = '!';

/// Where an instruction goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Raw shell command (marker stripped)
    Shell(String),
    /// Natural-language instruction for the chat pipeline
    Chat(String),
}

/// Splits instructions on a leading marker character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandRouter {
    shell_escape: char,
}

impl CommandRouter {
    /// Create a router with a custom marker
    #[must_use]
    pub fn new(shell_escape: char) -> Self {
        Self { shell_escape }
    }

    /// The marker character
    #[must_use]
    pub fn shell_escape(&self) -> char {
        self.shell_escape
    }

    /// Route one line of input
    ///
    /// # Errors
    /// Returns [`Error::EmptyInput`] for blank input or a bare marker.
    pub fn route(&self, input: &str) -> Result<Route> {
        let text = input.trim();
        if text.is_empty() {
            return Err(Error::EmptyInput);
        }

        match text.strip_prefix(self.shell_escape) {
            Some(command) => {
                let command = command.trim();
                if command.is_empty() {
                    return Err(Error::EmptyInput);
                }
                Ok(Route::Shell(command.to_string()))
            }
            None => Ok(Route::Chat(text.to_string())),
        }
    }
}

impl Default for CommandRouter {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL_ESCAPE)
    }
}
