//! # Parse Errors
//!
//! Errors raised while normalizing a request into a canonical command.
//! All of them are local validation failures and are never retried.

use thiserror::Error;

/// Result type for command parsing
pub type ParseResult<T> = Result<T, ParseError>;

/// Command parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No command name could be found in the request
    #[error("No command provided")]
    NoCommandProvided,

    /// The request carried an empty command array
    #[error("Empty command array")]
    EmptyCommandArray,

    /// The request shape is not one of the accepted encodings
    #[error("Invalid command format: {0}")]
    InvalidCommandFormat(String),

    /// One element of a batch failed to parse
    #[error("Error in command at index {index}: {message}")]
    IndexedBatchError { index: usize, message: String },
}

impl ParseError {
    /// Create an invalid-format error
    pub fn invalid_format(detail: impl Into<String>) -> Self {
        Self::InvalidCommandFormat(detail.into())
    }

    /// Wrap an inner error with the batch index it came from
    pub fn at_index(index: usize, inner: &ParseError) -> Self {
        Self::IndexedBatchError {
            index,
            message: inner.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_error_names_index_and_reason() {
        let err = ParseError::at_index(3, &ParseError::EmptyCommandArray);
        let msg = err.to_string();
        assert!(msg.contains('3'));
        assert!(msg.contains("Empty command array"));
    }
}
