//! Shared HTTP plumbing for the network-backed providers

use crate::error::{Error, Result};
use crate::util::{sanitize_error_for_user, summarize_body};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Build the HTTP client shared by a provider instance
pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Transport(format!("failed to build HTTP client: {e}")))
}

/// Error reasons some upstreams send with HTTP 400 for a rejected key
const KEY_REJECTED_REASONS: &[&str] = &["API_KEY_INVALID"];

/// Send a prepared request and decode a successful JSON body
///
/// 401/403 (and a 400 naming a rejected key) become [`Error::Auth`], any
/// other non-2xx status becomes [`Error::Api`] carrying a shortened body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &str,
    request: RequestBuilder,
    timeout: Duration,
) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| map_send_error(e, timeout))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| map_send_error(e, timeout))?;

    debug!(provider, status = status.as_u16(), "Received upstream response");

    if !status.is_success() {
        return Err(status_error(provider, status, &body));
    }

    serde_json::from_str(&body)
        .map_err(|e| Error::InvalidResponse(format!("{provider}: {e}")))
}

fn status_error(provider: &str, status: StatusCode, body: &str) -> Error {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::Auth(format!("{provider} returned HTTP {}", status.as_u16()))
        }
        StatusCode::BAD_REQUEST if KEY_REJECTED_REASONS.iter().any(|r| body.contains(r)) => {
            Error::Auth(format!("{provider} returned HTTP 400: API key rejected"))
        }
        _ => Error::Api(format!(
            "{provider} returned HTTP {}: {}",
            status.as_u16(),
            summarize_body(body)
        )),
    }
}

fn map_send_error(error: reqwest::Error, timeout: Duration) -> Error {
    if error.is_timeout() {
        return Error::Timeout(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
    }
    // SECURITY: strip the URL, it may carry a query-string key
    let error = error.without_url();
    Error::Transport(sanitize_error_for_user(&error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_mapping() {
        assert!(status_error("openai", StatusCode::UNAUTHORIZED, "").is_auth());
        assert!(status_error("openai", StatusCode::FORBIDDEN, "nope").is_auth());

        let gemini_bad_key = r#"{"error":{"code":400,"status":"INVALID_ARGUMENT","details":[{"reason":"API_KEY_INVALID"}]}}"#;
        assert!(status_error("gemini", StatusCode::BAD_REQUEST, gemini_bad_key).is_auth());
        assert!(!status_error("gemini", StatusCode::BAD_REQUEST, "{}").is_auth());

        match status_error("openai", StatusCode::INTERNAL_SERVER_ERROR, "  boom  ") {
            Error::Api(msg) => {
                assert!(msg.contains("500"));
                assert!(msg.ends_with("boom"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
