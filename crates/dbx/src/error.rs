//! Error types for dbx

use std::time::Duration;
use thiserror::Error;

/// Result type alias for dbx operations
pub type DbxResult<T> = Result<T, DbxError>;

/// Error types for database operations.
///
/// Every failure surfaced by the gateway is one of these four kinds. Driver
/// errors are converted once at the adapter boundary; a `DbxError` travelling
/// up through the builder is passed along untouched.
#[derive(Debug, Error)]
pub enum DbxError {
    /// No executor is available to run the statement
    #[error("Configuration error: {0}")]
    Config(String),

    /// The driver rejected or failed the statement
    #[error("Statement error: {0}")]
    Statement(String),

    /// The statement did not complete before its deadline
    #[error("Statement timeout after {0:?}")]
    Timeout(Duration),

    /// The result shape did not match what the caller asked for
    #[error("Mapping error: {0}")]
    Mapping(String),
}

impl DbxError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a statement error
    pub fn statement(message: impl Into<String>) -> Self {
        Self::Statement(message.into())
    }

    /// Create a mapping error
    pub fn mapping(message: impl Into<String>) -> Self {
        Self::Mapping(message.into())
    }

    /// Check if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this is a statement error
    pub fn is_statement(&self) -> bool {
        matches!(self, Self::Statement(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Check if this is a mapping error
    pub fn is_mapping(&self) -> bool {
        matches!(self, Self::Mapping(_))
    }
}

#[cfg(feature = "mysql")]
impl From<mysql_async::Error> for DbxError {
    fn from(err: mysql_async::Error) -> Self {
        Self::Statement(err.to_string())
    }
}
