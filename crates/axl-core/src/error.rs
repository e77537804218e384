//! Error types for AXL operations

use thiserror::Error;

/// Result type for AXL operations
pub type Result<T> = std::result::Result<T, AxlError>;

/// Errors raised by the dispatcher, normalizer and projection layers
#[derive(Debug, Error)]
pub enum AxlError {
    /// Object type is not registered, or not valid for the requested mode
    #[error("Object type {type_name} is not supported for {operation}")]
    UnsupportedType {
        type_name: String,
        operation: &'static str,
    },

    /// Reply envelope did not have the expected `return` structure
    #[error("Malformed reply: {0}")]
    MalformedReply(String),

    /// A record expected to carry a field did not
    #[error("Record {index} does not have a value for field {field}")]
    MissingField { index: usize, field: String },

    /// A lookup that must match exactly one object matched some other count
    #[error("{procedure} returned {count} results, not exactly 1 as expected")]
    AmbiguousResult { procedure: String, count: usize },

    /// Caller supplied data that cannot form a valid request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Transport level failure, passed through untouched
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AxlError {
    /// Create an unsupported type error
    pub fn unsupported(type_name: impl Into<String>, operation: &'static str) -> Self {
        Self::UnsupportedType {
            type_name: type_name.into(),
            operation,
        }
    }

    /// Create a malformed reply error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedReply(message.into())
    }

    /// Create a missing field error
    pub fn missing_field(index: usize, field: impl Into<String>) -> Self {
        Self::MissingField {
            index,
            field: field.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Errors surfaced by an [`AxlTransport`](crate::transport::AxlTransport)
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP layer failure (connect, TLS, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status without a SOAP fault body
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// SOAP fault returned by the server
    #[error("SOAP fault {code}: {message}")]
    Fault { code: String, message: String },

    /// Request encoding or response decoding failure
    #[error("XML error: {0}")]
    Xml(String),
}

impl TransportError {
    /// Create an XML codec error
    pub fn xml(message: impl Into<String>) -> Self {
        Self::Xml(message.into())
    }
}

impl From<quick_xml::Error> for TransportError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err.to_string())
    }
}

impl From<config::ConfigError> for AxlError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
