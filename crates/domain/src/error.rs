//! Unified error type for the domain layer.

use thiserror::Error;

/// Errors produced by domain-level validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Invalid identifier format
    #[error("Invalid ID format: {0}")]
    InvalidId(String),
}

impl DomainError {
    /// Create a validation error for invariant violations.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an invalid ID error.
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = DomainError::validation("balance must not be negative");
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(
            err.to_string(),
            "Validation failed: balance must not be negative"
        );
    }

    #[test]
    fn test_invalid_id_error() {
        let err = DomainError::invalid_id("session id must not be empty");
        assert!(matches!(err, DomainError::InvalidId(_)));
        assert!(err.to_string().contains("must not be empty"));
    }
}
