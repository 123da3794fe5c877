//! # Direct Rule Comparison
//!
//! Evaluates each rule against the live value at its field, independently
//! of the compiled schema. The two layers are expected to agree; a
//! disagreement points at a compiler or merge bug.
//!
//! ## Coercion Policy
//!
//! - Relational operators (`>`, `>=`, `<`, `<=`) coerce both sides to
//!   numbers. JSON numbers coerce as-is; strings coerce when their trimmed
//!   text parses as a finite number. Anything else fails coercion, and a
//!   failed coercion is a violation (fail-closed), never a pass.
//! - Equality operators (`==`, `!=`) compare loosely without failing: a
//!   number equals a numeric literal of the same value, a string equals
//!   identical text, booleans and null equal their JSON spelling, and
//!   arrays and objects equal nothing.
//! - A field missing from the document is always a violation.

use jsre_core::path::resolve_data;
use jsre_core::rule::parse_number;
use jsre_core::{Condition, Rule, ValidationIssue};
use serde_json::Value;

/// Coerce a document value to a number for relational comparison.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Loose equality between a document value and a rule literal.
pub fn loose_eq(value: &Value, literal: &str) -> bool {
    match value {
        Value::Number(n) => match (n.as_f64(), parse_number(literal)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        Value::String(s) => s == literal,
        Value::Bool(b) => literal.trim() == if *b { "true" } else { "false" },
        Value::Null => literal.trim() == "null",
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Whether `value` satisfies `rule`.
pub fn satisfies(value: &Value, rule: &Rule) -> bool {
    match rule.condition {
        Condition::Eq => loose_eq(value, &rule.value),
        Condition::Ne => !loose_eq(value, &rule.value),
        Condition::Gt | Condition::Ge | Condition::Lt | Condition::Le => {
            let (Some(actual), Some(bound)) = (coerce_number(value), rule.numeric_value()) else {
                return false;
            };
            match rule.condition {
                Condition::Gt => actual > bound,
                Condition::Ge => actual >= bound,
                Condition::Lt => actual < bound,
                _ => actual <= bound,
            }
        }
    }
}

/// Check one rule against a document; `None` means it holds.
pub fn check_rule(document: &Value, rule: &Rule) -> Option<ValidationIssue> {
    let path = match rule.path() {
        Ok(path) => path,
        Err(e) => return Some(ValidationIssue::rule(&rule.id, "", e.to_string())),
    };
    let pointer = path.to_pointer();
    match resolve_data(document, &path) {
        None => Some(ValidationIssue::rule(
            &rule.id,
            pointer,
            format!("{} does not exist", rule.field),
        )),
        Some(value) if satisfies(value, rule) => None,
        Some(_) => Some(ValidationIssue::rule(
            &rule.id,
            pointer,
            rule.violation_message(),
        )),
    }
}

/// Check every rule, in list order.
pub fn check_rules(document: &Value, rules: &[Rule]) -> Vec<ValidationIssue> {
    rules
        .iter()
        .filter_map(|rule| check_rule(document, rule))
        .collect()
}
