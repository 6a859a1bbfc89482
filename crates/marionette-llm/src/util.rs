//! Common utilities for LLM providers
//!
//! Helpers shared across providers for keeping secrets out of logs and
//! error messages.

/// Minimum key length to display partial key
const MIN_KEY_LENGTH_FOR_PARTIAL_DISPLAY: usize = 8;

/// Number of characters to show at start/end of masked key
const KEY_MASK_VISIBLE_CHARS: usize = 4;

/// Longest upstream error body carried into an error message
pub const MAX_ERROR_BODY: usize = 300;

/// Sensitive patterns to filter from error messages
const SENSITIVE_PATTERNS: &[&str] = &[
    "api_key",
    "api-key",
    "apikey",
    "authorization",
    "bearer",
    "secret",
    "password",
    "credential",
];

/// Mask API key for safe display in logs
///
/// Shows first 4 and last 4 characters for keys longer than 8 characters,
/// otherwise shows "****" to prevent exposure of short keys.
///
/// # Examples
/// ```
/// use marionette_llm::util::mask_api_key;
/// assert_eq!(mask_api_key("sk-1234567890abcdef"), "sk-1...cdef");
/// assert_eq!(mask_api_key("short"), "****");
/// ```
#[must_use]
pub fn mask_api_key(key: &str) -> String {
    if key.len() <= MIN_KEY_LENGTH_FOR_PARTIAL_DISPLAY || !key.is_ascii() {
        return "****".to_string();
    }
    format!(
        "{}...{}",
        &key[..KEY_MASK_VISIBLE_CHARS],
        &key[key.len() - KEY_MASK_VISIBLE_CHARS..]
    )
}

/// Sanitize error message for user display
///
/// If the error contains sensitive patterns, returns a generic error message.
///
/// # Examples
/// ```
/// use marionette_llm::util::sanitize_error_for_user;
/// assert_eq!(
///     sanitize_error_for_user("Invalid api_key provided"),
///     "An API error occurred. Please try again."
/// );
/// assert_eq!(
///     sanitize_error_for_user("Connection timeout"),
///     "Connection timeout"
/// );
/// ```
#[must_use]
pub fn sanitize_error_for_user(error: &str) -> String {
    let lower = error.to_lowercase();

    for pattern in SENSITIVE_PATTERNS {
        if lower.contains(pattern) {
            return "An API error occurred. Please try again.".to_string();
        }
    }

    error.to_string()
}

/// Truncate a string at a char boundary no later than `max_len` bytes
#[must_use]
pub fn truncate_safe(text: &str, max_len: usize) -> &str {
    if text.len() <= max_len {
        return text;
    }
    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Shorten an upstream error body for inclusion in an error message
#[must_use]
pub fn summarize_body(body: &str) -> String {
    let body = body.trim();
    if body.len() > MAX_ERROR_BODY {
        format!("{}...(truncated)", truncate_safe(body, MAX_ERROR_BODY))
    } else {
        body.to_string()
    }
}
