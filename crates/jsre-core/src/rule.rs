//! # Rules
//!
//! A [`Rule`] is a single `field condition value` constraint. Rules arrive
//! as raw text ([`ProposedRule`], usually parsed from an input line by
//! [`RuleInput::parse`]) and become typed [`Rule`]s once their shape checks
//! out.
//!
//! The record shape is `{id, field, condition, value, isValid, message?}`.
//! Older records without `isValid` deserialize with `is_valid = false`.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{OperatorMismatchError, RuleShapeError};
use crate::path::FieldPath;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    /// `==`
    #[serde(rename = "==")]
    Eq,
    /// `!=`
    #[serde(rename = "!=")]
    Ne,
    /// `>`
    #[serde(rename = ">")]
    Gt,
    /// `<`
    #[serde(rename = "<")]
    Lt,
    /// `>=`
    #[serde(rename = ">=")]
    Ge,
    /// `<=`
    #[serde(rename = "<=")]
    Le,
}

impl Condition {
    /// All six operators.
    pub const ALL: [Condition; 6] = [
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Lt,
        Self::Ge,
        Self::Le,
    ];

    /// Parse an operator token.
    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == token.trim())
    }

    /// The operator token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
        }
    }

    /// Whether the operator orders values (and therefore needs numbers).
    pub fn is_relational(&self) -> bool {
        matches!(self, Self::Gt | Self::Lt | Self::Ge | Self::Le)
    }

    /// The phrase used in default violation messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Eq => "must be equal to",
            Self::Ne => "must not be equal to",
            Self::Gt => "must be greater than",
            Self::Lt => "must be less than",
            Self::Ge => "must be greater than or equal to",
            Self::Le => "must be less than or equal to",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a rule value as a finite number, the way rule comparisons coerce it.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// A shape-checked rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Unique within an active rule set.
    pub id: String,
    /// Dotted field path.
    pub field: String,
    /// Comparison operator.
    pub condition: Condition,
    /// Comparison literal, numeric or textual.
    pub value: String,
    /// Set once the rule has been trial-validated and committed.
    #[serde(default)]
    pub is_valid: bool,
    /// Custom violation message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Rule {
    /// A new, uncommitted rule with a random id.
    pub fn new(field: impl Into<String>, condition: Condition, value: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            field: field.into(),
            condition,
            value: value.into(),
            is_valid: false,
            message: None,
        }
    }

    /// Replace the generated id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Attach a custom violation message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// The parsed field path.
    pub fn path(&self) -> Result<FieldPath, RuleShapeError> {
        FieldPath::parse(&self.field)
    }

    /// The value as a finite number, if it is one.
    pub fn numeric_value(&self) -> Option<f64> {
        parse_number(&self.value)
    }

    /// Fail when a relational operator is paired with a non-numeric value.
    pub fn check_operator(&self) -> Result<(), OperatorMismatchError> {
        if self.condition.is_relational() && self.numeric_value().is_none() {
            return Err(OperatorMismatchError {
                field: self.field.clone(),
                condition: self.condition.to_string(),
                value: self.value.clone(),
            });
        }
        Ok(())
    }

    /// The custom message, or `"<field> must be greater than <value>"` etc.
    pub fn violation_message(&self) -> String {
        match &self.message {
            Some(m) => m.clone(),
            None => format!("{} {} {}", self.field, self.condition.describe(), self.value),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.condition, self.value)
    }
}

/// A rule as entered, before any checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedRule {
    /// Caller-chosen id; one is generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    /// Dotted field path, unchecked.
    #[serde(default)]
    pub field: String,
    /// Operator token, unchecked.
    #[serde(default)]
    pub condition: String,
    /// Comparison literal, unchecked.
    #[serde(default)]
    pub value: String,
    /// Custom violation message.
    #[serde(default)]
    pub message: Option<String>,
}

impl ProposedRule {
    /// A proposal from its three raw parts.
    pub fn new(
        field: impl Into<String>,
        condition: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            field: field.into(),
            condition: condition.into(),
            value: value.into(),
            message: None,
        }
    }

    /// Check the shape and produce a typed rule.
    ///
    /// A trailing `;` on the value is dropped. The resulting rule is not yet
    /// valid: `is_valid` is only set on commit.
    ///
    /// # Errors
    ///
    /// Returns the first [`RuleShapeError`] found, checking the field, then
    /// the condition, then the value.
    pub fn into_rule(self) -> Result<(Rule, FieldPath), RuleShapeError> {
        let path = FieldPath::parse(&self.field)?;
        let condition = Condition::parse(&self.condition)
            .ok_or_else(|| RuleShapeError::InvalidCondition(self.condition.clone()))?;
        let value = self.value.trim();
        let value = value.strip_suffix(';').unwrap_or(value).trim();
        if value.is_empty() {
            return Err(RuleShapeError::EmptyValue);
        }
        let rule = Rule {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            field: path.as_str().to_string(),
            condition,
            value: value.to_string(),
            is_valid: false,
            message: self.message,
        };
        Ok((rule, path))
    }
}

impl From<Rule> for ProposedRule {
    fn from(rule: Rule) -> Self {
        Self {
            id: Some(rule.id),
            field: rule.field,
            condition: rule.condition.to_string(),
            value: rule.value,
            message: rule.message,
        }
    }
}

/// One line from the interactive-input collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleInput {
    /// A `field condition value` proposal.
    Rule(ProposedRule),
    /// The `done` sentinel.
    Done,
}

impl RuleInput {
    /// Sentinel that ends rule collection (case-insensitive).
    pub const DONE: &'static str = "done";

    /// Parse `"field condition value"` or the `done` sentinel.
    ///
    /// The value is everything after the condition token, so textual values
    /// may contain spaces (`terms == Net 7`).
    ///
    /// # Errors
    ///
    /// Returns [`RuleShapeError::MalformedInput`] when fewer than three
    /// tokens are present.
    pub fn parse(line: &str) -> Result<Self, RuleShapeError> {
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case(Self::DONE) {
            return Ok(Self::Done);
        }
        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        if tokens.len() < 3 {
            return Err(RuleShapeError::MalformedInput(trimmed.to_string()));
        }
        Ok(Self::Rule(ProposedRule::new(
            tokens[0],
            tokens[1],
            tokens[2..].join(" "),
        )))
    }
}
