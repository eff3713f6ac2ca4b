// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error types for auditbot
//!
//! Fetch and parse errors on a single page are recovered locally (the page is
//! recorded as failed and the run continues); configuration errors abort the
//! run before any page is visited.

use thiserror::Error;

/// Main error type for auditbot
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("connection refused for {url}")]
    ConnectionRefused { url: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("parse error at {url}: {message}")]
    Parse { url: String, message: String },

    #[error("validator fault in rule {rule}: {message}")]
    Validation { rule: String, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, AuditError>;

impl AuditError {
    /// Classify a reqwest error into the typed fetch taxonomy.
    pub fn from_fetch(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AuditError::Timeout { url: url.to_string() }
        } else if err.is_connect() {
            AuditError::ConnectionRefused { url: url.to_string() }
        } else {
            AuditError::Transport { url: url.to_string(), source: err }
        }
    }

    /// Whether this error is recoverable at page scope. Recoverable errors
    /// are recorded on the page result and the run continues; everything
    /// else aborts the run.
    pub fn is_page_recoverable(&self) -> bool {
        matches!(
            self,
            AuditError::Timeout { .. }
                | AuditError::ConnectionRefused { .. }
                | AuditError::HttpStatus { .. }
                | AuditError::Transport { .. }
                | AuditError::Parse { .. }
                | AuditError::Validation { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_not_recoverable() {
        let err = AuditError::Config("missing binary".to_string());
        assert!(!err.is_page_recoverable());
    }

    #[test]
    fn test_fetch_errors_recoverable() {
        let err = AuditError::Timeout { url: "https://example.com".to_string() };
        assert!(err.is_page_recoverable());

        let err = AuditError::HttpStatus { url: "https://example.com".to_string(), status: 503 };
        assert!(err.is_page_recoverable());
    }

    #[test]
    fn test_error_messages_carry_url() {
        let err = AuditError::HttpStatus { url: "https://example.com/pricing".to_string(), status: 404 };
        assert!(err.to_string().contains("https://example.com/pricing"));
        assert!(err.to_string().contains("404"));
    }
}
