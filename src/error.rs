use std::io;
use thiserror::Error;

/// Custom error type for the collector
#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Malformed {label} field '{key}': cannot parse '{token}'")]
    MalformedField {
        label: String,
        key: String,
        token: String,
    },

    #[error("Malformed {label} line header: {reason}")]
    MalformedMetadata { label: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sink error: {0}")]
    Sink(String),

    #[error("Producer error: {0}")]
    Producer(String),
}

/// Result type alias for the collector
pub type Result<T> = std::result::Result<T, CollectorError>;

impl CollectorError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        CollectorError::Config(msg.into())
    }

    /// Create a sink error
    pub fn sink<S: Into<String>>(msg: S) -> Self {
        CollectorError::Sink(msg.into())
    }

    /// Create a producer error
    pub fn producer<S: Into<String>>(msg: S) -> Self {
        CollectorError::Producer(msg.into())
    }

    pub fn malformed_field(label: &str, key: &str, token: &str) -> Self {
        CollectorError::MalformedField {
            label: label.to_string(),
            key: key.to_string(),
            token: token.to_string(),
        }
    }

    pub fn malformed_metadata<S: Into<String>>(label: &str, reason: S) -> Self {
        CollectorError::MalformedMetadata {
            label: label.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors confined to a single input line.
    pub fn is_line_local(&self) -> bool {
        matches!(
            self,
            CollectorError::MalformedField { .. } | CollectorError::MalformedMetadata { .. }
        )
    }
}
