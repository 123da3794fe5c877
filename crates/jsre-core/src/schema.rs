//! # Schema Trees
//!
//! [`SchemaNode`] is the constrained JSON Schema subset the engine produces
//! and consumes: `type`, `properties`, `required`, `items`, `format`,
//! `minimum`/`maximum` with boolean exclusive flags, `enum`, and a negated
//! `enum` under `not`.
//!
//! ## Invariants
//!
//! - Every node carries exactly one [`SchemaType`].
//! - `properties` is a sorted map, so keys are unique and serialization is
//!   deterministic regardless of insertion order.
//! - `required` is an ordered set: [`SchemaNode::require`] never inserts a
//!   duplicate.
//! - Empty `properties` / `required` are omitted when serialized; an empty
//!   `required` array is not a legal draft-4 keyword.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaLoadError;

/// The single `type` of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    /// JSON string.
    String,
    /// Any JSON number.
    Number,
    /// Whole JSON number. Only appears in hand-authored base schemas.
    Integer,
    /// JSON boolean.
    Boolean,
    /// JSON object.
    Object,
    /// JSON array.
    Array,
    /// JSON null.
    Null,
}

impl SchemaType {
    /// The runtime kind of a document value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// The keyword spelling (`"string"`, `"number"`, ...).
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Null => "null",
        }
    }

    /// Whether numeric bounds are meaningful for this type.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Number | Self::Integer)
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The `not: {enum: [...]}` keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Negation {
    /// Literals the value must not equal.
    #[serde(rename = "enum")]
    pub values: Vec<Value>,
}

/// Validation keywords a rule compiles to.
///
/// `minimum` travels with `exclusiveMinimum` (and likewise for the maximum):
/// overlaying a new bound replaces the exclusive flag too, so a `>=` rule
/// applied after a `>` rule does not inherit exclusivity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    /// Lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    /// Upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    /// Draft-4 style flag making `minimum` exclusive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<bool>,
    /// Draft-4 style flag making `maximum` exclusive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<bool>,
    /// Allowed literals.
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<Value>>,
    /// Forbidden literals.
    #[serde(rename = "not", default, skip_serializing_if = "Option::is_none")]
    pub forbidden: Option<Negation>,
}

impl Constraints {
    /// True when no keyword is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Overlay `other` onto `self`; keywords set in `other` win.
    pub fn overlay(&mut self, other: &Constraints) {
        if other.minimum.is_some() {
            self.minimum = other.minimum;
            self.exclusive_minimum = other.exclusive_minimum;
        }
        if other.maximum.is_some() {
            self.maximum = other.maximum;
            self.exclusive_maximum = other.exclusive_maximum;
        }
        if other.allowed.is_some() {
            self.allowed.clone_from(&other.allowed);
        }
        if other.forbidden.is_some() {
            self.forbidden.clone_from(&other.forbidden);
        }
    }
}

/// A node in a schema tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    /// Exactly one type.
    #[serde(rename = "type")]
    pub schema_type: SchemaType,
    /// Child schemas of an object node.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, SchemaNode>,
    /// Names that must be present on an object node.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Element schema of an array node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,
    /// String format assertion (`uuid`, `date`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Rule-derived keywords.
    #[serde(flatten)]
    pub constraints: Constraints,
}

impl SchemaNode {
    /// A bare node of the given type.
    pub fn new(schema_type: SchemaType) -> Self {
        Self {
            schema_type,
            properties: BTreeMap::new(),
            required: Vec::new(),
            items: None,
            format: None,
            constraints: Constraints::default(),
        }
    }

    /// An array node with the given element schema.
    pub fn array(items: SchemaNode) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::new(SchemaType::Array)
        }
    }

    /// Whether this node is an object node.
    pub fn is_object(&self) -> bool {
        self.schema_type == SchemaType::Object
    }

    /// Add `name` to `required` unless already present.
    pub fn require(&mut self, name: &str) {
        if !self.required.iter().any(|r| r == name) {
            self.required.push(name.to_string());
        }
    }

    /// Build a tree from a schema document.
    ///
    /// The document must already be `$ref`-free; unknown keywords such as
    /// `$schema` are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaLoadError::InvalidShape`] when a node lacks a single
    /// string `type` or a keyword has the wrong shape.
    pub fn from_document(document: Value) -> Result<Self, SchemaLoadError> {
        Ok(serde_json::from_value(document)?)
    }

    /// Serialize the tree into a schema document.
    pub fn to_document(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Every dotted path declared in this tree.
    ///
    /// Descends through object `properties` and through the `items` of array
    /// nodes whose elements are objects; array element paths are reported
    /// under the array's own name, so an array `lines` of objects with a
    /// `qty` key yields `lines` and `lines.qty`.
    pub fn field_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect_paths(self, "", &mut out);
        out
    }
}

fn collect_paths(node: &SchemaNode, prefix: &str, out: &mut Vec<String>) {
    for (name, child) in &node.properties {
        let full = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        out.push(full.clone());
        collect_paths(child, &full, out);
        if let Some(items) = &child.items {
            collect_paths(items, &full, out);
        }
    }
}
