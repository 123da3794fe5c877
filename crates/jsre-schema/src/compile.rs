//! # Rule Compilation
//!
//! Turns a [`Rule`] into the validation keywords it implies:
//!
//! | condition | fragment |
//! |---|---|
//! | `>`  | `{minimum: v, exclusiveMinimum: true}` |
//! | `>=` | `{minimum: v}` |
//! | `<`  | `{maximum: v, exclusiveMaximum: true}` |
//! | `<=` | `{maximum: v}` |
//! | `==` | `{enum: [v]}` |
//! | `!=` | `{not: {enum: [v]}}` |
//!
//! A relational condition whose value is not a number has no schema
//! expression and fails with [`OperatorMismatchError`].
//!
//! [`compile_rules`] materializes a rule schema: each rule's top-level
//! property is seeded from the structural schema, the rest of the path is
//! walked (creating missing intermediate objects), and the fragment is
//! applied at the leaf. Every node along a rule's path is marked required
//! in its parent, so the schema layer and the rule layer agree that the
//! field must exist.

use jsre_core::{
    Condition, Constraints, Negation, OperatorMismatchError, Rule, RuleShapeError, SchemaNode,
    SchemaType,
};
use serde_json::Value;
use thiserror::Error;

/// Error compiling a rule set into a rule schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A rule's field is not a valid dotted path.
    #[error("rule {rule_id}: {source}")]
    Shape {
        /// The offending rule.
        rule_id: String,
        /// The path problem.
        source: RuleShapeError,
    },

    /// A relational rule has a non-numeric value.
    #[error("rule {rule_id}: {source}")]
    OperatorMismatch {
        /// The offending rule.
        rule_id: String,
        /// The mismatch.
        source: OperatorMismatchError,
    },
}

/// Compile one rule without knowledge of the target leaf.
pub fn compile(rule: &Rule) -> Result<Constraints, OperatorMismatchError> {
    compile_for(rule, None)
}

/// Compile one rule for a leaf of the given type.
///
/// The leaf type only affects equality literals: a `string` leaf compares
/// against the text as written, a `boolean` or `null` leaf against the
/// matching JSON literal, and anything else against the number when the
/// value parses as one.
pub fn compile_for(
    rule: &Rule,
    target: Option<SchemaType>,
) -> Result<Constraints, OperatorMismatchError> {
    let mut fragment = Constraints::default();
    match rule.condition {
        Condition::Gt | Condition::Ge | Condition::Lt | Condition::Le => {
            let bound = rule.numeric_value().ok_or_else(|| OperatorMismatchError {
                field: rule.field.clone(),
                condition: rule.condition.to_string(),
                value: rule.value.clone(),
            })?;
            match rule.condition {
                Condition::Gt => {
                    fragment.minimum = Some(bound);
                    fragment.exclusive_minimum = Some(true);
                }
                Condition::Ge => fragment.minimum = Some(bound),
                Condition::Lt => {
                    fragment.maximum = Some(bound);
                    fragment.exclusive_maximum = Some(true);
                }
                _ => fragment.maximum = Some(bound),
            }
        }
        Condition::Eq => fragment.allowed = Some(vec![literal_for(rule, target)]),
        Condition::Ne => {
            fragment.forbidden = Some(Negation {
                values: vec![literal_for(rule, target)],
            })
        }
    }
    Ok(fragment)
}

fn literal_for(rule: &Rule, target: Option<SchemaType>) -> Value {
    let text = rule.value.trim();
    match target {
        Some(SchemaType::String) => Value::String(rule.value.clone()),
        Some(SchemaType::Boolean) => match text {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(rule.value.clone()),
        },
        Some(SchemaType::Null) if text == "null" => Value::Null,
        _ => numeric_literal(rule).unwrap_or_else(|| Value::String(rule.value.clone())),
    }
}

fn numeric_literal(rule: &Rule) -> Option<Value> {
    rule.numeric_value()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

/// The type given to a leaf the structural schema does not declare.
fn leaf_type_for(rule: &Rule) -> SchemaType {
    if rule.numeric_value().is_some() {
        SchemaType::Number
    } else {
        SchemaType::String
    }
}

/// Build the rule schema for `rules` against the structural schema `base`.
///
/// Rules apply in list order; when several rules constrain one leaf, later
/// keyword writes win.
///
/// # Errors
///
/// Returns the first rule that cannot be compiled.
pub fn compile_rules(base: &SchemaNode, rules: &[Rule]) -> Result<SchemaNode, CompileError> {
    let mut rule_schema = SchemaNode::new(SchemaType::Object);
    for rule in rules {
        let path = rule.path().map_err(|source| CompileError::Shape {
            rule_id: rule.id.clone(),
            source,
        })?;
        let Some((leaf_name, parents)) = path.segments().split_last() else {
            continue;
        };

        let mut node = &mut rule_schema;
        let mut base_node = Some(base);
        for name in parents {
            let base_child = base_node.and_then(|b| b.properties.get(name));
            node.require(name);
            node = node
                .properties
                .entry(name.clone())
                .or_insert_with(|| {
                    base_child
                        .cloned()
                        .unwrap_or_else(|| SchemaNode::new(SchemaType::Object))
                });
            base_node = base_child;
        }

        let base_leaf = base_node.and_then(|b| b.properties.get(leaf_name));
        node.require(leaf_name);
        let leaf = node.properties.entry(leaf_name.clone()).or_insert_with(|| {
            base_leaf
                .cloned()
                .unwrap_or_else(|| SchemaNode::new(leaf_type_for(rule)))
        });
        let fragment = compile_for(rule, Some(leaf.schema_type)).map_err(|source| {
            CompileError::OperatorMismatch {
                rule_id: rule.id.clone(),
                source,
            }
        })?;
        leaf.constraints.overlay(&fragment);
        tracing::debug!(rule = %rule, "compiled rule fragment");
    }
    Ok(rule_schema)
}
