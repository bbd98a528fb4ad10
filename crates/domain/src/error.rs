//! Unified error types for the domain layer
//!
//! `DomainError` covers rejected player actions and invalid state transitions.
//! `ValidationError` and `CaseLoadError` cover malformed case documents, which
//! are fatal to initialization: an engine never starts with an invalid case.

use std::fmt;

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Entity not found
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Business rule violation
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Parse error (for value objects and persisted snapshots)
    #[error("Parse error: {0}")]
    Parse(String),

    /// State transition not allowed
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),
}

impl DomainError {
    /// Creates a validation error for values outside their allowed range.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Create a constraint violation error
    ///
    /// Used when a player action is well-formed but the game rules refuse it,
    /// e.g. accusing before enough evidence has been collected.
    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::Constraint(msg.into())
    }

    /// Creates a parse error for string-to-type conversion failures.
    ///
    /// # Example
    /// ```ignore
    /// impl FromStr for Importance {
    ///     type Err = DomainError;
    ///     fn from_str(s: &str) -> Result<Self, Self::Err> {
    ///         match s {
    ///             "low" => Ok(Self::Low),
    ///             _ => Err(DomainError::parse(format!("Unknown importance: {}", s))),
    ///         }
    ///     }
    /// }
    /// ```
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an invalid state transition error
    pub fn invalid_state_transition(msg: impl Into<String>) -> Self {
        Self::InvalidStateTransition(msg.into())
    }

    /// Check if this is a NotFound error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// =============================================================================
// Case document errors
// =============================================================================

/// A single problem found in a case document.
///
/// `field` is a dotted path into the document (`metadata.difficulty`,
/// `evidence[2].importance`), `expected` names the violated constraint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid field `{field}`: expected {expected}")]
pub struct ValidationError {
    pub field: String,
    pub expected: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
        }
    }

    /// The field is absent from the document.
    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, "a value (field is required)")
    }

    /// The field is present with the wrong JSON type.
    pub fn wrong_type(field: impl Into<String>, expected_type: &str) -> Self {
        Self::new(field, format!("a value of type {}", expected_type))
    }
}

/// Error returned when a case document cannot become a `CaseDefinition`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CaseLoadError {
    /// The input was not JSON at all.
    #[error("Case document is not valid JSON: {0}")]
    Json(String),

    /// A required field is missing or has the wrong shape.
    #[error("Malformed case document: {0}")]
    Malformed(#[from] ValidationError),

    /// The document parsed but violates structural invariants.
    #[error("Inconsistent case document: {}", ValidationList(.0))]
    Inconsistent(Vec<ValidationError>),
}

struct ValidationList<'a>(&'a [ValidationError]);

impl fmt::Display for ValidationList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = DomainError::validation("speed must be positive");
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(err.to_string(), "Validation failed: speed must be positive");
    }

    #[test]
    fn test_not_found_error() {
        let err = DomainError::not_found("Evidence", "torn_glove");
        assert!(err.is_not_found());
        assert!(err.to_string().contains("Evidence"));
        assert!(err.to_string().contains("torn_glove"));
    }

    #[test]
    fn test_constraint_error() {
        let err = DomainError::constraint("case already solved");
        assert_eq!(err.to_string(), "Constraint violation: case already solved");
    }

    #[test]
    fn test_case_field_error_names_field_and_constraint() {
        let err = ValidationError::new("metadata.difficulty", "an integer between 1 and 5");
        assert_eq!(
            err.to_string(),
            "invalid field `metadata.difficulty`: expected an integer between 1 and 5"
        );
    }

    #[test]
    fn test_inconsistent_case_lists_every_problem() {
        let err = CaseLoadError::Inconsistent(vec![
            ValidationError::new("suspects", "exactly one guilty suspect"),
            ValidationError::new("solution.culprit", "an existing suspect id"),
        ]);
        let text = err.to_string();
        assert!(text.contains("suspects"));
        assert!(text.contains("solution.culprit"));
    }
}
