//! Error types for the MongoDB helper.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for helper operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for connection, translation and database operations
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Client construction or liveness check failed
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The shared client was used before `configure`
    #[error("MongoDB client has not been configured")]
    NotConfigured,

    /// The `request-format` parameter is not a flat JSON object of strings
    #[error("Bad request-format: {0}")]
    BadFormat(String),

    /// A query value could not be coerced to its declared kind
    #[error("Parse error: field '{field}' value '{value}': {reason}")]
    Parse {
        field: String,
        value: String,
        reason: String,
    },

    /// Error returned by the driver, passed through untouched
    #[error(transparent)]
    Driver(#[from] mongodb::error::Error),

    /// The per-operation deadline expired
    #[error("Operation '{operation}' timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    /// No document matched the filter
    #[error("No document found in collection '{collection}'")]
    NotFound { collection: String },

    /// A value could not be serialized to BSON
    #[error("Encode error: {0}")]
    Encode(String),

    /// A BSON document could not be mapped to the requested shape
    #[error("Decode error: {0}")]
    Decode(String),
}

impl Error {
    /// Build a parse error for a query field
    pub(crate) fn parse(field: &str, value: &str, reason: impl ToString) -> Self {
        Error::Parse {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True when the error means no document matched
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// True when the per-operation deadline expired
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_mentions_field_and_value() {
        let err = Error::parse("age", "abc", "invalid digit found in string");
        let message = err.to_string();
        assert!(message.contains("age"));
        assert!(message.contains("abc"));
    }

    #[test]
    fn test_error_classification() {
        let not_found = Error::NotFound {
            collection: "users".to_string(),
        };
        assert!(not_found.is_not_found());
        assert!(!not_found.is_timeout());

        let timeout = Error::Timeout {
            operation: "count",
            timeout: Duration::from_secs(10),
        };
        assert!(timeout.is_timeout());
        assert!(timeout.to_string().contains("count"));
    }
}
