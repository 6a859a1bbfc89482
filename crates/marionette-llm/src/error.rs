//! Error types for marionette-llm

use thiserror::Error;

/// Provider error type
///
/// Every backend maps its failures onto these variants, so callers never see
/// a provider-specific error shape.
#[derive(Debug, Error)]
pub enum Error {
    /// Provider not configured
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// Configuration rejected during normalization
    #[error("invalid provider configuration: {0}")]
    InvalidConfig(String),

    /// Credentials rejected by the upstream service
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Network or connection failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Timeout
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// Upstream returned a non-success status
    #[error("api error: {0}")]
    Api(String),

    /// Response body did not have the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl Error {
    /// Whether this error was caused by rejected credentials
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
