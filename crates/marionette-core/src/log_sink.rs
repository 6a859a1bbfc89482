//! Log Sink - process-wide activity log
//!
//! Append-only, timestamped at append time. Entries are rendered as
//! `"<time> | <LEVEL> | <message>"` for the dashboard and the HTTP API.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::{error, info};

/// Timestamp format used for every entry
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DELIMITER: &str = " | ";

/// Severity / source of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Lifecycle and configuration events
    System,
    /// Instruction text as submitted
    User,
    /// Intent summary returned by the model
    Ai,
    /// Successful action
    Ok,
    /// Any failure
    Error,
    /// Raw shell output
    Terminal,
    /// Everything else
    Info,
}

impl LogLevel {
    /// Every level, in display order
    pub const ALL: [LogLevel; 7] = [
        LogLevel::System,
        LogLevel::User,
        LogLevel::Ai,
        LogLevel::Ok,
        LogLevel::Error,
        LogLevel::Terminal,
        LogLevel::Info,
    ];

    /// Lowercase name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::System => "system",
            LogLevel::User => "user",
            LogLevel::Ai => "ai",
            LogLevel::Ok => "ok",
            LogLevel::Error => "error",
            LogLevel::Terminal => "terminal",
            LogLevel::Info => "info",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        LogLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == lowered)
            .ok_or_else(|| format!("unknown log level: {s}"))
    }
}

/// One timestamped log record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Local wall-clock time, `%Y-%m-%d %H:%M:%S`
    pub timestamp: String,
    /// Level
    pub level: LogLevel,
    /// Free text
    pub message: String,
}

impl LogEntry {
    /// Render as a single delimited line with an upper-cased level
    #[must_use]
    pub fn format_line(&self) -> String {
        format!(
            "{}{DELIMITER}{}{DELIMITER}{}",
            self.timestamp,
            self.level.as_str().to_ascii_uppercase(),
            self.message
        )
    }

    /// Parse a rendered line, splitting on the first two delimiters only
    #[must_use]
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut parts = line.splitn(3, DELIMITER);
        let timestamp = parts.next()?.to_string();
        let level = parts.next()?.parse().ok()?;
        let message = parts.next()?.to_string();
        Some(Self {
            timestamp,
            level,
            message,
        })
    }
}

/// Append-only log shared by every component
#[derive(Debug, Default)]
pub struct LogSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl LogSink {
    /// Create an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, stamped with the current local time
    pub fn append(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Error => error!(target: "marionette::activity", kind = %level, "{message}"),
            _ => info!(target: "marionette::activity", kind = %level, "{message}"),
        }

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        // stamped under the lock so timestamps never go backwards
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        entries.push(LogEntry {
            timestamp,
            level,
            message,
        });
    }

    /// Full snapshot in append order
    #[must_use]
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The last `n` entries in append order
    #[must_use]
    pub fn tail(&self, n: usize) -> Vec<LogEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let start = entries.len().saturating_sub(n);
        entries[start..].to_vec()
    }

    /// Rendered lines; `None` returns everything
    #[must_use]
    pub fn lines(&self, limit: Option<usize>) -> Vec<String> {
        let entries = match limit {
            Some(n) => self.tail(n),
            None => self.snapshot(),
        };
        entries.iter().map(LogEntry::format_line).collect()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// True when nothing has been logged
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
