//! # `$ref` Expansion
//!
//! Hand-authored schema documents may point at shared sub-schemas with
//! document-local references such as
//! `{"$ref": "#/properties/receivable/properties/supplier/properties/address"}`.
//! They are expanded once, at load time, into a fully materialized tree so
//! inference, compilation, merging, and path resolution only ever walk
//! plain trees.
//!
//! Keywords next to a `$ref` are ignored, as in draft 4 through 7.

use std::path::Path;

use jsre_core::{SchemaLoadError, SchemaNode};
use serde_json::{Map, Value};

/// Expand every local `$ref` in `document`.
///
/// # Errors
///
/// - [`SchemaLoadError::ExternalRef`] for references not starting with `#`.
/// - [`SchemaLoadError::UnresolvedRef`] when the pointer has no target.
/// - [`SchemaLoadError::CyclicRef`] when a reference (transitively) contains itself.
pub fn expand_refs(document: &Value) -> Result<Value, SchemaLoadError> {
    let mut active = Vec::new();
    expand(document, document, &mut active)
}

fn expand(root: &Value, node: &Value, active: &mut Vec<String>) -> Result<Value, SchemaLoadError> {
    match node {
        Value::Object(map) => {
            if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
                return expand_reference(root, reference, active);
            }
            let mut out = Map::with_capacity(map.len());
            for (key, child) in map {
                out.insert(key.clone(), expand(root, child, active)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(elements) => elements
            .iter()
            .map(|child| expand(root, child, active))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Ok(node.clone()),
    }
}

fn expand_reference(
    root: &Value,
    reference: &str,
    active: &mut Vec<String>,
) -> Result<Value, SchemaLoadError> {
    let Some(pointer) = reference.strip_prefix('#') else {
        return Err(SchemaLoadError::ExternalRef {
            reference: reference.to_string(),
        });
    };
    if active.iter().any(|r| r == reference) {
        return Err(SchemaLoadError::CyclicRef {
            reference: reference.to_string(),
        });
    }
    let target = root
        .pointer(pointer)
        .ok_or_else(|| SchemaLoadError::UnresolvedRef {
            reference: reference.to_string(),
        })?;

    active.push(reference.to_string());
    let expanded = expand(root, target, active);
    active.pop();
    expanded
}

/// Expand references and build a typed tree from a schema document.
pub fn load_schema(document: &Value) -> Result<SchemaNode, SchemaLoadError> {
    let expanded = expand_refs(document)?;
    SchemaNode::from_document(expanded)
}

/// Read a JSON schema file, expand references, and build a typed tree.
pub fn load_schema_file(path: impl AsRef<Path>) -> Result<SchemaNode, SchemaLoadError> {
    let content = std::fs::read_to_string(path)?;
    let document: Value = serde_json::from_str(&content)?;
    load_schema(&document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn shared_address_is_materialized() {
        let doc = json!({
            "type": "object",
            "properties": {
                "supplier": {
                    "type": "object",
                    "properties": {
                        "address": {"type": "object", "properties": {"city": {"type": "string"}}}
                    }
                },
                "billTo": {
                    "type": "object",
                    "properties": {
                        "address": {"$ref": "#/properties/supplier/properties/address"}
                    }
                }
            }
        });
        let expanded = expand_refs(&doc).unwrap();
        assert_eq!(
            expanded["properties"]["billTo"]["properties"]["address"],
            doc["properties"]["supplier"]["properties"]["address"]
        );
        assert!(!expanded.to_string().contains("$ref"));
    }

    #[test]
    fn nested_references_expand_transitively() {
        let doc = json!({
            "type": "object",
            "properties": {
                "a": {"type": "string"},
                "b": {"$ref": "#/properties/a"},
                "c": {"$ref": "#/properties/b"}
            }
        });
        let node = load_schema(&doc).unwrap();
        assert_eq!(node.properties["c"].schema_type, jsre_core::SchemaType::String);
    }

    #[test]
    fn cycles_are_rejected() {
        let doc = json!({
            "type": "object",
            "properties": {
                "node": {
                    "type": "object",
                    "properties": {"child": {"$ref": "#/properties/node"}}
                }
            }
        });
        assert!(matches!(
            expand_refs(&doc),
            Err(SchemaLoadError::CyclicRef { .. })
        ));
    }

    #[test]
    fn dangling_and_external_references_are_rejected() {
        let dangling = json!({"type": "object", "properties": {"x": {"$ref": "#/nope"}}});
        assert!(matches!(
            expand_refs(&dangling),
            Err(SchemaLoadError::UnresolvedRef { .. })
        ));
        let external = json!({"$ref": "https://example.com/s.json"});
        assert!(matches!(
            expand_refs(&external),
            Err(SchemaLoadError::ExternalRef { .. })
        ));
    }
}
