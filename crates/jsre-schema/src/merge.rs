//! # Schema Merging
//!
//! Overlays a rule schema onto a structural schema.
//!
//! The top-level `properties` are unioned; on a key collision the two
//! entries are overlaid node by node: `type`, `items`, and `format` are
//! kept from the structural side whenever it declares them, while the rule
//! side's validation keywords win. `required` lists are unioned as ordered
//! sets at every level. Because [`compile_rules`] seeds each rule entry from
//! the structural schema, the overlay reduces to the one-level union in
//! practice; the recursion only matters for rule schemas built against a
//! different base.
//!
//! Merging is idempotent: `merge(merge(b, r), r) == merge(b, r)`.

use jsre_core::{Rule, SchemaNode};

use crate::compile::compile_rules;

/// Merge a rule schema into a structural schema.
pub fn merge(base: &SchemaNode, rule_schema: &SchemaNode) -> SchemaNode {
    let mut merged = base.clone();
    overlay(&mut merged, rule_schema);
    merged
}

fn overlay(target: &mut SchemaNode, rules: &SchemaNode) {
    for name in &rules.required {
        target.require(name);
    }
    for (name, rule_child) in &rules.properties {
        match target.properties.get_mut(name) {
            Some(existing) => overlay(existing, rule_child),
            None => {
                target.properties.insert(name.clone(), rule_child.clone());
            }
        }
    }
    if target.items.is_none() {
        target.items.clone_from(&rules.items);
    }
    if target.format.is_none() {
        target.format.clone_from(&rules.format);
    }
    target.constraints.overlay(&rules.constraints);
}

/// Compile `rules` against `base` and merge the result.
///
/// Never fails: when the rule set cannot be compiled the plain structural
/// schema is returned and the failure is logged.
pub fn merged_schema(base: &SchemaNode, rules: &[Rule]) -> SchemaNode {
    if rules.is_empty() {
        return base.clone();
    }
    match compile_rules(base, rules) {
        Ok(rule_schema) => merge(base, &rule_schema),
        Err(e) => {
            tracing::warn!(error = %e, "rule compilation failed; using structural schema");
            base.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsre_core::{Condition, EngineConfig, SchemaType};
    use serde_json::json;

    fn base() -> SchemaNode {
        crate::infer(
            &json!({
                "invoiceNumber": "INV-24000446",
                "totals": {"amountPaid": 205011.64, "taxTotal": 1320.0}
            }),
            &EngineConfig::default(),
        )
    }

    #[test]
    fn rule_keywords_land_on_the_leaf_and_siblings_survive() {
        let base = base();
        let rules = vec![Rule::new("totals.amountPaid", Condition::Gt, "500")];
        let merged = merged_schema(&base, &rules);

        let totals = &merged.properties["totals"];
        assert_eq!(totals.properties["amountPaid"].constraints.minimum, Some(500.0));
        assert!(totals.properties.contains_key("taxTotal"));
        assert!(merged.properties.contains_key("invoiceNumber"));
        assert_eq!(merged.required, vec!["invoiceNumber", "totals"]);
    }

    #[test]
    fn structural_type_is_preserved_on_collision() {
        let base = base();
        let mut rule_schema = SchemaNode::new(SchemaType::Object);
        let mut wrong = SchemaNode::new(SchemaType::String);
        wrong.constraints.allowed = Some(vec![json!("X")]);
        rule_schema.properties.insert("invoiceNumber".into(), wrong);

        let merged = merge(&base, &rule_schema);
        let leaf = &merged.properties["invoiceNumber"];
        assert_eq!(leaf.schema_type, SchemaType::String);
        assert_eq!(leaf.constraints.allowed, Some(vec![json!("X")]));

        let mut numeric = SchemaNode::new(SchemaType::Object);
        numeric
            .properties
            .insert("totals".into(), SchemaNode::new(SchemaType::Number));
        let merged = merge(&base, &numeric);
        assert_eq!(merged.properties["totals"].schema_type, SchemaType::Object);
    }

    #[test]
    fn required_union_has_no_duplicates() {
        let base = base();
        let mut rule_schema = SchemaNode::new(SchemaType::Object);
        rule_schema.require("totals");
        rule_schema.require("extra");
        let merged = merge(&base, &rule_schema);
        assert_eq!(merged.required, vec!["invoiceNumber", "totals", "extra"]);
    }

    #[test]
    fn merge_is_idempotent() {
        let base = base();
        let rules = vec![
            Rule::new("totals.amountPaid", Condition::Gt, "500"),
            Rule::new("invoiceNumber", Condition::Ne, "INV-0"),
            Rule::new("meta.flag", Condition::Eq, "1"),
        ];
        let once = merged_schema(&base, &rules);
        let twice = merged_schema(&base, &rules);
        assert_eq!(once, twice);

        let rule_schema = compile_rules(&base, &rules).unwrap();
        let again = merge(&once, &rule_schema);
        assert_eq!(again, once);
    }

    #[test]
    fn compilation_failure_falls_back_to_base() {
        let base = base();
        let rules = vec![Rule::new("totals.amountPaid", Condition::Gt, "lots")];
        assert_eq!(merged_schema(&base, &rules), base);
    }
}
