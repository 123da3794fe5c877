//! # Validation Engine
//!
//! Compiles a merged schema once and validates documents against it
//! repeatedly. A report concatenates two groups:
//!
//! 1. Issues from the compiled schema (type mismatches, missing required
//!    fields, format violations, bound and enum violations), in the order
//!    the validator yields them.
//! 2. Issues from each active rule's direct comparison, in rule order.
//!
//! Schema issues whose top-level field is in the optional-exemption set are
//! dropped before the report is returned.
//!
//! ## Draft
//!
//! Rule fragments use boolean `exclusiveMinimum`/`exclusiveMaximum`, so
//! schemas are compiled with draft 4 semantics. `uuid` and `date` formats
//! are registered as custom formats and asserted.
//!
//! ## Thread Safety
//!
//! `ValidationEngine` is `Send + Sync` and `validate` takes `&self`.
//! [`SharedValidator`] holds the current engine behind an `Arc` under a
//! read-write lock; replacing it swaps the reference under the write lock,
//! so a concurrent reader either keeps the old engine or sees the new one,
//! never a partial one.

use std::fmt;
use std::sync::Arc;

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, Validator};
use jsre_core::{
    EngineConfig, Rule, SchemaCompileError, SchemaNode, ValidationIssue, ValidationReport,
};
use parking_lot::RwLock;
use serde_json::Value;

use crate::compare::check_rules;
use crate::formats::{is_date, is_uuid};
use crate::infer::infer;
use crate::merge::merged_schema;

/// A compiled schema plus the rules it was merged from.
pub struct ValidationEngine {
    schema: SchemaNode,
    rules: Vec<Rule>,
    optional_fields: Vec<String>,
    validator: Validator,
}

impl fmt::Debug for ValidationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationEngine")
            .field("schema", &self.schema)
            .field("rules", &self.rules)
            .field("optional_fields", &self.optional_fields)
            .finish_non_exhaustive()
    }
}

impl ValidationEngine {
    /// Compile `schema` for repeated validation with `rules` as the
    /// direct-comparison layer.
    ///
    /// `schema` should already contain the rules' fragments; see
    /// [`ValidationEngine::from_base`] to merge and compile in one step.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaCompileError`] if the schema cannot be serialized or
    /// the validator rejects it.
    pub fn compile(
        schema: SchemaNode,
        rules: Vec<Rule>,
        config: &EngineConfig,
    ) -> Result<Self, SchemaCompileError> {
        let document = schema.to_document().map_err(|e| SchemaCompileError {
            reason: format!("cannot serialize schema: {e}"),
        })?;

        let mut opts = jsonschema::options();
        opts.with_draft(Draft::Draft4);
        opts.should_validate_formats(true);
        if config.formats.uuid {
            opts.with_format("uuid", is_uuid);
        }
        if config.formats.date {
            opts.with_format("date", is_date);
        }
        let validator = opts.build(&document).map_err(|e| SchemaCompileError {
            reason: e.to_string(),
        })?;

        tracing::debug!(
            rules = rules.len(),
            properties = schema.properties.len(),
            "compiled validation engine"
        );
        Ok(Self {
            schema,
            rules,
            optional_fields: config.optional_fields.clone(),
            validator,
        })
    }

    /// Merge `rules` into `base` and compile the result.
    pub fn from_base(
        base: &SchemaNode,
        rules: Vec<Rule>,
        config: &EngineConfig,
    ) -> Result<Self, SchemaCompileError> {
        let merged = merged_schema(base, &rules);
        Self::compile(merged, rules, config)
    }

    /// Infer a base schema from `sample`, merge `rules`, and compile.
    pub fn from_sample(
        sample: &Value,
        rules: Vec<Rule>,
        config: &EngineConfig,
    ) -> Result<Self, SchemaCompileError> {
        Self::from_base(&infer(sample, config), rules, config)
    }

    /// The merged schema this engine was compiled from.
    pub fn schema(&self) -> &SchemaNode {
        &self.schema
    }

    /// The rules evaluated by the direct-comparison layer.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Validate a document. Always returns the complete list of issues.
    pub fn validate(&self, document: &Value) -> ValidationReport {
        let report = ValidationReport::new(
            self.schema_issues(document),
            check_rules(document, &self.rules),
        );
        tracing::debug!(issues = report.len(), "validated document");
        report
    }

    /// Issues from the compiled schema only, exemptions applied.
    pub fn schema_issues(&self, document: &Value) -> Vec<ValidationIssue> {
        self.validator
            .iter_errors(document)
            .filter_map(|error| {
                let path = error.instance_path.to_string();
                let top_level = match &error.kind {
                    ValidationErrorKind::Required { property } if path.is_empty() => {
                        property.as_str().map(str::to_string)
                    }
                    _ => None,
                };
                let issue = ValidationIssue::schema(path, error.to_string());
                let field = top_level.or_else(|| issue.top_level_field());
                match field {
                    Some(name) if self.is_optional(&name) => None,
                    _ => Some(issue),
                }
            })
            .collect()
    }

    fn is_optional(&self, name: &str) -> bool {
        self.optional_fields.iter().any(|f| f == name)
    }
}

/// The engine currently in force, replaceable by a single writer.
#[derive(Debug)]
pub struct SharedValidator {
    current: RwLock<Arc<ValidationEngine>>,
}

impl SharedValidator {
    /// Share `engine`.
    pub fn new(engine: ValidationEngine) -> Self {
        Self {
            current: RwLock::new(Arc::new(engine)),
        }
    }

    /// A handle to the current engine. The handle stays valid after a
    /// replacement.
    pub fn current(&self) -> Arc<ValidationEngine> {
        Arc::clone(&self.current.read())
    }

    /// Swap in a new engine, returning the previous one.
    pub fn replace(&self, engine: ValidationEngine) -> Arc<ValidationEngine> {
        let next = Arc::new(engine);
        let mut guard = self.current.write();
        std::mem::replace(&mut *guard, next)
    }

    /// Validate against the current engine.
    pub fn validate(&self, document: &Value) -> ValidationReport {
        self.current().validate(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsre_core::{Condition, IssueSource};
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "externalTransactionId": "4342336d-ded2-4e20-ace8-3d63276be455",
            "issueDate": "2024-01-22",
            "purchaseOrderNumber": "PO-4342336d",
            "totals": {"amountPaid": 205011.64}
        })
    }

    fn engine(rules: Vec<Rule>) -> ValidationEngine {
        ValidationEngine::from_sample(&sample(), rules, &EngineConfig::default()).unwrap()
    }

    #[test]
    fn sample_validates_against_its_own_schema() {
        assert!(engine(vec![]).validate(&sample()).is_valid());
    }

    #[test]
    fn satisfied_rule_produces_no_issues() {
        let rules = vec![Rule::new("totals.amountPaid", Condition::Gt, "500")];
        let report = engine(rules).validate(&json!({
            "externalTransactionId": "4342336d-ded2-4e20-ace8-3d63276be455",
            "issueDate": "2024-01-22",
            "totals": {"amountPaid": 205011.64}
        }));
        assert!(report.is_valid(), "{report}");
    }

    #[test]
    fn violated_rule_reports_schema_then_rule_issue() {
        let rules = vec![Rule::new("totals.amountPaid", Condition::Lt, "500").with_id("r1")];
        let report = engine(rules).validate(&sample());
        assert_eq!(report.len(), 2, "{report}");
        let issues = report.issues();
        assert_eq!(issues[0].source, IssueSource::Schema);
        assert_eq!(issues[0].path, "/totals/amountPaid");
        assert_eq!(
            issues[1].source,
            IssueSource::Rule {
                rule_id: "r1".into()
            }
        );
        assert_eq!(
            issues[1].to_string(),
            "/totals/amountPaid totals.amountPaid must be less than 500"
        );
    }

    #[test]
    fn exclusive_bounds_are_exclusive() {
        let rules = vec![Rule::new("totals.amountPaid", Condition::Gt, "205011.64")];
        let report = engine(rules).validate(&sample());
        assert_eq!(report.schema_issues().count(), 1, "{report}");
        assert_eq!(report.rule_issues().count(), 1, "{report}");
    }

    #[test]
    fn type_mismatch_is_reported() {
        let mut doc = sample();
        doc["totals"]["amountPaid"] = json!("a lot");
        let report = engine(vec![]).validate(&doc);
        assert_eq!(report.len(), 1);
        assert_eq!(report.issues()[0].path, "/totals/amountPaid");
    }

    fn formatted() -> SchemaNode {
        SchemaNode::from_document(json!({
            "type": "object",
            "properties": {
                "externalTransactionId": {"type": "string", "format": "uuid"},
                "issueDate": {"type": "string", "format": "date"}
            }
        }))
        .unwrap()
    }

    #[test]
    fn custom_formats_are_asserted() {
        let engine =
            ValidationEngine::compile(formatted(), vec![], &EngineConfig::default()).unwrap();
        assert!(engine.validate(&sample()).is_valid());

        let mut doc = sample();
        doc["externalTransactionId"] = json!("not-a-uuid");
        doc["issueDate"] = json!("2024-02-30");
        let report = engine.validate(&doc);
        let paths: Vec<_> = report.issues().iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths.len(), 2, "{report}");
        assert!(paths.contains(&"/externalTransactionId"), "{report}");
        assert!(paths.contains(&"/issueDate"), "{report}");
    }

    #[test]
    fn disabled_formats_are_not_asserted() {
        let config = EngineConfig::from_yaml_str("formats: {uuid: false}").unwrap();
        let engine = ValidationEngine::compile(formatted(), vec![], &config).unwrap();
        let mut doc = sample();
        doc["externalTransactionId"] = json!("not-a-uuid");
        // Draft 4 has no built-in uuid format.
        assert!(engine.validate(&doc).is_valid());
    }

    #[test]
    fn missing_required_field_is_reported_but_exempt_field_is_not() {
        let engine = engine(vec![]);
        let mut doc = sample();
        doc.as_object_mut().unwrap().remove("purchaseOrderNumber");
        assert!(engine.validate(&doc).is_valid());

        doc.as_object_mut().unwrap().remove("issueDate");
        let report = engine.validate(&doc);
        assert_eq!(report.len(), 1);
        assert!(report.issues()[0].message.contains("issueDate"), "{report}");
    }

    #[test]
    fn exempt_fields_are_filtered_even_when_declared_required() {
        let schema = SchemaNode::from_document(json!({
            "type": "object",
            "properties": {
                "purchaseOrderNumber": {"type": "string"},
                "terms": {"type": "string"}
            },
            "required": ["purchaseOrderNumber", "terms"]
        }))
        .unwrap();
        let engine = ValidationEngine::compile(schema, vec![], &EngineConfig::default()).unwrap();
        let report = engine.validate(&json!({"purchaseOrderNumber": 7}));
        assert_eq!(report.len(), 1, "{report}");
        assert!(report.issues()[0].message.contains("terms"));
    }

    #[test]
    fn shared_validator_swaps_engines() {
        let shared = SharedValidator::new(engine(vec![]));
        let held = shared.current();
        assert!(shared.validate(&sample()).is_valid());

        let old = shared.replace(engine(vec![Rule::new(
            "totals.amountPaid",
            Condition::Lt,
            "500",
        )]));
        assert!(old.rules().is_empty());
        assert!(held.validate(&sample()).is_valid());
        assert!(!shared.validate(&sample()).is_valid());
    }

    #[test]
    fn engines_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ValidationEngine>();
        assert_send_sync::<SharedValidator>();
    }
}
