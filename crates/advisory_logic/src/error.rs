//! Error types for the advisory logic engine.

use thiserror::Error;

/// A specialized `Result` type for advisory logic operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Defines the errors that can occur while building rule tables and running the engine.
///
/// Search exhaustion is deliberately absent: an iteration cap is reported through
/// [`SearchOutcome::IterationLimit`](crate::proof::SearchOutcome), not as an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A rule was defined incorrectly (empty id, antecedent or consequent).
    #[error("Invalid rule definition: {0}")]
    InvalidRule(String),

    /// Two rules in the same table share an identifier.
    #[error("Duplicate rule id: {0}")]
    DuplicateRule(String),

    /// `single_literal` was called on a clause that does not hold exactly one literal.
    #[error("Not a unit clause: {clause} has {len} literals")]
    NotUnitClause { clause: String, len: usize },

    /// An engine configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A network mode string could not be parsed.
    #[error("Unknown network mode: {0}")]
    UnknownMode(String),

    /// A `RefutationProof` failed structural checks.
    #[error("Proof invalid: {0}")]
    InvalidProof(String),

    /// An error occurred during data serialization or deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A rule table could not be read from disk.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidRule("antecedent cannot be empty".to_string());
        assert!(err.to_string().contains("antecedent cannot be empty"));
    }

    #[test]
    fn test_not_unit_clause_display() {
        let err = Error::NotUnitClause {
            clause: "A ∨ B".to_string(),
            len: 2,
        };
        assert_eq!(err.to_string(), "Not a unit clause: A ∨ B has 2 literals");
    }

    #[test]
    fn test_from_serde_error() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
