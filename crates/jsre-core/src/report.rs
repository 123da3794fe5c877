//! # Validation Reports
//!
//! Document validation never fails with an error: it returns a
//! [`ValidationReport`] holding every issue found, schema issues first and
//! rule issues second, each group in input order.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where an issue came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IssueSource {
    /// The compiled schema rejected the document.
    Schema,
    /// A rule's direct comparison failed.
    Rule {
        /// Id of the violated rule.
        rule_id: String,
    },
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// JSON-pointer-like location (`/totals/amountPaid`, empty for the root).
    pub path: String,
    /// Human-readable message.
    pub message: String,
    /// Which layer reported it.
    pub source: IssueSource,
}

impl ValidationIssue {
    /// An issue reported by the compiled schema.
    pub fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            source: IssueSource::Schema,
        }
    }

    /// An issue reported by a rule's direct comparison.
    pub fn rule(
        rule_id: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            source: IssueSource::Rule {
                rule_id: rule_id.into(),
            },
        }
    }

    /// The first segment of the path, unescaped.
    pub fn top_level_field(&self) -> Option<String> {
        self.path
            .strip_prefix('/')
            .and_then(|rest| rest.split('/').next())
            .filter(|s| !s.is_empty())
            .map(|s| s.replace("~1", "/").replace("~0", "~"))
    }

    /// Whether a rule reported this issue.
    pub fn is_rule_issue(&self) -> bool {
        matches!(self.source, IssueSource::Rule { .. })
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.path, self.message)
    }
}

/// Complete result of validating one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Assemble a report from its two ordered groups.
    pub fn new(schema_issues: Vec<ValidationIssue>, rule_issues: Vec<ValidationIssue>) -> Self {
        let mut issues = schema_issues;
        issues.extend(rule_issues);
        Self { issues }
    }

    /// Returns true if the document passed.
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns the number of issues.
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Returns true if there are no issues.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// All issues, schema group first.
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Issues from the compiled schema.
    pub fn schema_issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| !i.is_rule_issue())
    }

    /// Issues from rule comparisons.
    pub fn rule_issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.is_rule_issue())
    }

    /// Issue lines in `"<path> <message>"` form.
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<ValidationIssue> {
        self.issues
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}
