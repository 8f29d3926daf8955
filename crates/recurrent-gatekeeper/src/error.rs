//! Gatekeeper error types

use std::fmt;
use thiserror::Error;

/// Why a model response was rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationFailure {
    /// No parseable JSON in the response
    #[error("response is not valid JSON: {0}")]
    NotJson(String),

    /// JSON parsed but does not match the output schema
    #[error("response does not match output schema: {}", join_violations(.0))]
    Schema(Vec<SchemaViolation>),
}

impl ValidationFailure {
    /// Violations for a schema mismatch (empty for unparseable responses)
    pub fn violations(&self) -> &[SchemaViolation] {
        match self {
            ValidationFailure::NotJson(_) => &[],
            ValidationFailure::Schema(violations) => violations,
        }
    }
}

/// A single schema mismatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Location in the document, e.g. `$.topics[0].start_line`
    pub path: String,

    /// What the schema expected there
    pub expected: String,

    /// What the response contained
    pub found: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: expected {}, found {}", self.path, self.expected, self.found)
    }
}

fn join_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_failure_lists_every_violation() {
        let failure = ValidationFailure::Schema(vec![
            SchemaViolation {
                path: "$.summary".to_string(),
                expected: "string".to_string(),
                found: "number".to_string(),
            },
            SchemaViolation {
                path: "$.topics".to_string(),
                expected: "required property".to_string(),
                found: "nothing".to_string(),
            },
        ]);

        assert_eq!(
            failure.to_string(),
            "response does not match output schema: $.summary: expected string, found number; \
             $.topics: expected required property, found nothing"
        );
        assert_eq!(failure.violations().len(), 2);
    }

    #[test]
    fn test_not_json_has_no_violations() {
        let failure = ValidationFailure::NotJson("expected value at line 1".to_string());
        assert!(failure.violations().is_empty());
        assert!(failure.to_string().starts_with("response is not valid JSON"));
    }
}
