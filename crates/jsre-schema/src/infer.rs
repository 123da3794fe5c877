//! # Structural Inference
//!
//! Derives a [`SchemaNode`] tree from the shape of a sample document.
//! Inference is fresh on every call; nothing is cached between documents.
//!
//! Arrays are typed from their first element only. An empty array gets a
//! permissive `{type: "object"}` item schema, so a later document with
//! scalar elements in that array will be rejected; this is a known lossy
//! edge of sampling a single document.

use jsre_core::{EngineConfig, SchemaNode, SchemaType};
use serde_json::Value;

/// Infer a schema from `data`.
///
/// Every own key of every object becomes a property and is required,
/// except names in the configured optional-exemption set, which are
/// declared but never required.
pub fn infer(data: &Value, config: &EngineConfig) -> SchemaNode {
    match data {
        Value::Array(elements) => {
            let items = match elements.first() {
                Some(first) => infer(first, config),
                None => SchemaNode::new(SchemaType::Object),
            };
            SchemaNode::array(items)
        }
        Value::Object(map) => {
            let mut node = SchemaNode::new(SchemaType::Object);
            for (key, value) in map {
                node.properties.insert(key.clone(), infer(value, config));
                if !config.is_optional(key) {
                    node.require(key);
                }
            }
            node
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            SchemaNode::new(SchemaType::of(data))
        }
    }
}
