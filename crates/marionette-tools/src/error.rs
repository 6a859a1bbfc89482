//! Error types for marionette-tools

use thiserror::Error;

/// Action error type
///
/// Every variant is scoped to a single intent; the runner turns it into an
/// error result and moves on to the next one.
#[derive(Debug, Error)]
pub enum Error {
    /// Action not found
    #[error("action not found: {0}")]
    NotFound(String),

    /// Action execution failed
    #[error("execution failed: {0}")]
    Execution(String),

    /// Invalid input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Permission denied
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Timeout
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
