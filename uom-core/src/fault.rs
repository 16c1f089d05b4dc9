//! Raw faults as first observed at the I/O or validation boundary.
//!
//! A `Fault` never reaches a consumer: it is classified into a
//! `ClassifiedError` where it is observed.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Fault {
    /// Connection refused, DNS failure, reset
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    /// Non-success HTTP status from the data source (0 = no response)
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Http { status: u16, message: Option<String> },

    /// Local read failure (file-backed sources)
    #[error("I/O error: {0}")]
    Io(String),

    /// Payload could not be decoded
    #[error("malformed payload: {0}")]
    Parse(String),

    /// Free-text validation message from a server or form layer
    #[error("{0}")]
    Validation(String),

    /// Catalog records violating the data model
    #[error("data quality: {0}")]
    DataQuality(String),

    #[error("{0}")]
    Other(String),
}

impl Fault {
    pub fn http(status: u16) -> Self {
        Fault::Http { status, message: None }
    }

    pub fn http_with_message(status: u16, message: impl Into<String>) -> Self {
        Fault::Http { status, message: Some(message.into()) }
    }
}

impl From<std::io::Error> for Fault {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut => Fault::Timeout,
            std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::NotConnected => Fault::Network(err.to_string()),
            _ => Fault::Io(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Fault {
    fn from(err: serde_json::Error) -> Self {
        Fault::Parse(err.to_string())
    }
}
