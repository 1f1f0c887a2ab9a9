// src/error.rs

//! Unified error handling for the watcher.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built or used
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Listing page could not be fetched
    #[error("Fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// A notification channel is only partially configured
    #[error("{channel} settings incomplete, missing: {}", .missing.join(", "))]
    ConfigIncomplete {
        channel: String,
        missing: Vec<String>,
    },

    /// Building or sending an email failed
    #[error("Email error: {0}")]
    Email(String),

    /// Topic is not configured or is disabled
    #[error("No topic named '{0}' or it is disabled")]
    TopicUnavailable(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a fetch error for a URL.
    pub fn fetch(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an email error.
    pub fn email(message: impl fmt::Display) -> Self {
        Self::Email(message.to_string())
    }
}

/// Render an error together with every `source()` below it, one per line.
pub fn error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut lines = vec![error.to_string()];
    let mut current = error.source();
    while let Some(cause) = current {
        lines.push(format!("caused by: {cause}"));
        current = cause.source();
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_incomplete_lists_missing_fields() {
        let err = AppError::ConfigIncomplete {
            channel: "email".to_string(),
            missing: vec!["smtp_port".to_string(), "sender_password".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "email settings incomplete, missing: smtp_port, sender_password"
        );
    }

    #[test]
    fn test_error_chain_includes_sources() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = AppError::from(io);
        let chain = error_chain(&err);
        assert!(chain.starts_with("I/O error: read-only"));
    }

    #[test]
    fn test_fetch_error_display() {
        let err = AppError::fetch("https://example.com", "HTTP 503 Service Unavailable");
        assert_eq!(
            err.to_string(),
            "Fetch failed for https://example.com: HTTP 503 Service Unavailable"
        );
    }
}
