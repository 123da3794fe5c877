//! # Dotted Paths and Dual-Mode Resolution
//!
//! A [`FieldPath`] is a dotted string such as `totals.amountPaid`, parsed
//! once into its segments. Resolution walks the segments through one of two
//! tree shapes:
//!
//! - **Schema mode** walks `node.properties[name]` at every step. The result
//!   is a schema node and only answers "is this field declared".
//! - **Data mode** walks `current[name]` directly. The result is the live
//!   value used for comparison evaluation.
//!
//! Both modes return `None` when a segment is missing or an intermediate
//! value is not an object. Arrays are never indexed.
//!
//! A rule is admissible only when both modes agree that its field exists.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RuleShapeError;
use crate::schema::SchemaNode;

/// A parsed, non-empty dotted path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    /// Parse a dotted path.
    ///
    /// # Errors
    ///
    /// Returns [`RuleShapeError::EmptyField`] for an empty (or all-whitespace)
    /// string and [`RuleShapeError::EmptySegment`] when any segment between
    /// dots is empty.
    pub fn parse(raw: &str) -> Result<Self, RuleShapeError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(RuleShapeError::EmptyField);
        }
        let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(RuleShapeError::EmptySegment {
                field: raw.to_string(),
            });
        }
        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The dotted form, as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Individual property names, root first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The first segment: the top-level property this path lives under.
    pub fn head(&self) -> &str {
        // Construction guarantees at least one segment.
        self.segments.first().map(String::as_str).unwrap_or_default()
    }

    /// The last segment: the leaf property name.
    pub fn leaf(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// JSON-pointer form (`/totals/amountPaid`), escaping `~` and `/`.
    pub fn to_pointer(&self) -> String {
        self.segments
            .iter()
            .map(|s| format!("/{}", s.replace('~', "~0").replace('/', "~1")))
            .collect()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for FieldPath {
    type Err = RuleShapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Which tree shape a lookup walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMode {
    /// Walk `properties` of a schema tree.
    Schema,
    /// Walk a plain value tree.
    Data,
}

impl fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema => f.write_str("schema"),
            Self::Data => f.write_str("document"),
        }
    }
}

/// The result of a mode-detecting lookup over an untyped tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'a> {
    /// A schema node reached by walking `properties`.
    Schema(&'a Value),
    /// A live document value.
    Data(&'a Value),
}

impl<'a> Resolved<'a> {
    /// The resolved value, regardless of mode.
    pub fn value(&self) -> &'a Value {
        match self {
            Self::Schema(v) | Self::Data(v) => v,
        }
    }
}

/// Decide how an untyped tree should be walked.
///
/// A root with `"type": "object"` and a `properties` member is treated as a
/// schema; anything else is data. A data document that happens to carry both
/// keys at its root is indistinguishable from a schema here; callers that
/// know what they hold should use [`resolve_schema`] or [`resolve_data`].
pub fn detect_mode(root: &Value) -> ResolutionMode {
    let is_object_type = root.get("type").and_then(Value::as_str) == Some("object");
    let has_properties = root.get("properties").is_some_and(Value::is_object);
    if is_object_type && has_properties {
        ResolutionMode::Schema
    } else {
        ResolutionMode::Data
    }
}

/// Resolve `path` in `root`, choosing the mode by inspecting `root`.
pub fn resolve<'a>(root: &'a Value, path: &FieldPath) -> Option<Resolved<'a>> {
    match detect_mode(root) {
        ResolutionMode::Schema => resolve_schema_value(root, path).map(Resolved::Schema),
        ResolutionMode::Data => resolve_data(root, path).map(Resolved::Data),
    }
}

/// Data mode: walk `current[name]` for each segment.
pub fn resolve_data<'a>(root: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(root, |current, name| match current {
            Value::Object(map) => map.get(name),
            Value::Null
            | Value::Bool(_)
            | Value::Number(_)
            | Value::String(_)
            | Value::Array(_) => None,
        })
}

/// Schema mode over an untyped schema document.
pub fn resolve_schema_value<'a>(root: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    path.segments().iter().try_fold(root, |node, name| {
        node.get("properties")
            .and_then(Value::as_object)
            .and_then(|props| props.get(name))
    })
}

/// Schema mode over a typed tree.
pub fn resolve_schema<'a>(root: &'a SchemaNode, path: &FieldPath) -> Option<&'a SchemaNode> {
    path.segments()
        .iter()
        .try_fold(root, |node, name| node.properties.get(name))
}
