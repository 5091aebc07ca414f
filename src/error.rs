// src/error.rs

//! Unified error handling for the collector.

use std::fmt;

use thiserror::Error;

/// Result type alias for collector operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Input rejected before any network I/O
    #[error("Validation error: {0}")]
    Validation(String),

    /// Connection failure or non-2xx response
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request exceeded the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Expected markup was missing from a portal page
    #[error("Parse error: {0}")]
    Parse(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A new snapshot would replace a noticeably larger one
    #[error(
        "Refusing to overwrite snapshot: {current_count} records vs {previous_count} previously ({drop_percent:.1}% drop > {threshold_percent}%)"
    )]
    IncompleteRun {
        current_count: usize,
        previous_count: usize,
        drop_percent: f64,
        threshold_percent: u8,
    },
}

impl AppError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Whether another attempt at the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::Timeout(error.to_string());
        }
        match error.status() {
            Some(status) => Self::Transport(format!("HTTP {status}: {error}")),
            None => Self::Transport(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_and_timeout_are_retryable() {
        assert!(AppError::transport("connection refused").is_retryable());
        assert!(AppError::Timeout("30s".into()).is_retryable());
    }

    #[test]
    fn validation_and_parse_are_terminal() {
        assert!(!AppError::validation("term too old").is_retryable());
        assert!(!AppError::parse("no table").is_retryable());
        assert!(!AppError::config("bad").is_retryable());
    }

    #[test]
    fn incomplete_run_message_mentions_counts() {
        let err = AppError::IncompleteRun {
            current_count: 10,
            previous_count: 100,
            drop_percent: 90.0,
            threshold_percent: 20,
        };
        let message = err.to_string();
        assert!(message.contains("10 records"));
        assert!(message.contains("100 previously"));
    }
}
