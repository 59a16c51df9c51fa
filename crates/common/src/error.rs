use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The failure categories the system distinguishes.
///
/// Every error crossing a service boundary carries exactly one kind; HTTP
/// status mapping and propagation policy key off it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or out-of-range key, or a duplicate create.
    InvalidInput,
    /// The referenced root entity does not exist.
    NotFound,
    /// A backing service could not be reached.
    Unavailable,
    /// Transport/protocol failure or a defensive invariant violation.
    Unexpected,
}

/// Error type shared across the entity services, gateway and aggregator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Unexpected(String),
}

impl ServiceError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Unavailable(_) => ErrorKind::Unavailable,
            Self::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::InvalidInput(m) | Self::NotFound(m) | Self::Unavailable(m) | Self::Unexpected(m) => m,
        }
    }
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// The structured error body returned by every HTTP surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpErrorInfo {
    pub timestamp: DateTime<Utc>,
    pub path: String,
    pub status: u16,
    pub error: String,
    pub message: String,
}

impl HttpErrorInfo {
    pub fn new(path: impl Into<String>, status: u16, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            path: path.into(),
            status,
            error: error.into(),
            message: message.into(),
        }
    }
}
