//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error taxonomy of the rule engine. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Shape, field, and operator errors end only the current rule-addition
//!   attempt; the caller may retry with corrected input.
//! - Conflict errors carry the complete list of issues the trial
//!   validation produced.
//! - Compile errors are fatal at startup: nothing can be validated without
//!   a compiled base schema.
//! - Document validation failures are never errors. They are returned as a
//!   [`ValidationReport`](crate::report::ValidationReport).

use thiserror::Error;

use crate::path::ResolutionMode;
use crate::report::ValidationIssue;

/// Top-level error type for the rule engine.
#[derive(Error, Debug)]
pub enum JsreError {
    /// Malformed rule input.
    #[error(transparent)]
    RuleShape(#[from] RuleShapeError),

    /// Dotted path absent from the schema or the document.
    #[error(transparent)]
    FieldNotFound(#[from] FieldNotFoundError),

    /// Relational operator applied to a non-numeric value.
    #[error(transparent)]
    OperatorMismatch(#[from] OperatorMismatchError),

    /// Candidate rule invalidates the reference document.
    #[error(transparent)]
    RuleConflict(#[from] RuleConflictError),

    /// Schema could not be compiled into a validator.
    #[error(transparent)]
    SchemaCompile(#[from] SchemaCompileError),

    /// Schema document could not be loaded.
    #[error(transparent)]
    SchemaLoad(#[from] SchemaLoadError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Malformed rule input, detected before any resolution work.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleShapeError {
    /// The rule has no field path.
    #[error("rule shape error: field is required")]
    EmptyField,

    /// The field path contains an empty segment (e.g. `totals..amount`).
    #[error("rule shape error: field {field:?} contains an empty path segment")]
    EmptySegment {
        /// The offending field path.
        field: String,
    },

    /// The condition is not one of the six supported operators.
    #[error("rule shape error: invalid condition {0:?} (expected one of ==, !=, >, <, >=, <=)")]
    InvalidCondition(String),

    /// The rule has no comparison value.
    #[error("rule shape error: value is required")]
    EmptyValue,

    /// Another active rule already uses this id.
    #[error("rule shape error: duplicate rule id {0:?}")]
    DuplicateId(String),

    /// An input line could not be split into `field condition value`.
    #[error("rule shape error: expected \"field condition value\", got {0:?}")]
    MalformedInput(String),
}

/// A dotted field path did not resolve.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("field {field:?} does not exist in the {mode}{}", suggestion_suffix(.suggestion))]
pub struct FieldNotFoundError {
    /// The dotted path that failed to resolve.
    pub field: String,
    /// The tree the lookup was performed against.
    pub mode: ResolutionMode,
    /// A declared path sharing the longest prefix with `field`, if any.
    pub suggestion: Option<String>,
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean {s:?}?)"),
        None => String::new(),
    }
}

/// A relational operator was paired with a value that is not a number.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("operator mismatch: {field} {condition} {value:?} compares against a non-numeric value")]
pub struct OperatorMismatchError {
    /// The rule's field path.
    pub field: String,
    /// The relational operator.
    pub condition: String,
    /// The value that failed to parse as a number.
    pub value: String,
}

/// The candidate rule, combined with the active rules, invalidates the
/// reference document.
#[derive(Error, Debug, Clone)]
#[error("rule {rule_id} conflicts with the reference document: {}", join_issues(.issues))]
pub struct RuleConflictError {
    /// Id of the rejected candidate.
    pub rule_id: String,
    /// Every issue the trial validation produced, in report order.
    pub issues: Vec<ValidationIssue>,
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A schema could not be compiled into a reusable validator.
#[derive(Error, Debug, Clone)]
#[error("schema compile error: {reason}")]
pub struct SchemaCompileError {
    /// Reason reported by the validator builder.
    pub reason: String,
}

/// A schema document could not be turned into a [`SchemaNode`](crate::SchemaNode) tree.
#[derive(Error, Debug)]
pub enum SchemaLoadError {
    /// A `$ref` pointer does not resolve inside the document.
    #[error("unresolved $ref {reference:?}")]
    UnresolvedRef {
        /// The reference string.
        reference: String,
    },

    /// Expanding a `$ref` would recurse forever.
    #[error("cyclic $ref {reference:?}")]
    CyclicRef {
        /// The reference string.
        reference: String,
    },

    /// Only local `#/...` references are supported.
    #[error("unsupported $ref {reference:?}: only document-local pointers are expanded")]
    ExternalRef {
        /// The reference string.
        reference: String,
    },

    /// The expanded document is not a well-formed schema tree.
    #[error("invalid schema document: {0}")]
    InvalidShape(#[from] serde_json::Error),

    /// IO error reading a schema file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Engine configuration could not be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The YAML was malformed or had the wrong shape.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// IO error reading the configuration file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_not_found_display_includes_suggestion() {
        let err = FieldNotFoundError {
            field: "totals.amountPayed".into(),
            mode: ResolutionMode::Schema,
            suggestion: Some("totals.amountPaid".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("does not exist in the schema"), "{msg}");
        assert!(msg.contains("did you mean \"totals.amountPaid\""), "{msg}");
    }

    #[test]
    fn field_not_found_display_without_suggestion() {
        let err = FieldNotFoundError {
            field: "nope".into(),
            mode: ResolutionMode::Data,
            suggestion: None,
        };
        assert_eq!(err.to_string(), "field \"nope\" does not exist in the document");
    }

    #[test]
    fn shape_errors_convert_into_top_level() {
        let err: JsreError = RuleShapeError::EmptyValue.into();
        assert!(matches!(err, JsreError::RuleShape(RuleShapeError::EmptyValue)));
        assert_eq!(err.to_string(), "rule shape error: value is required");
    }
}
