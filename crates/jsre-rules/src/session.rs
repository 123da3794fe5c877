//! # Rule Session
//!
//! The explicit context for one rule-collection run. A session owns the
//! structural schema, the engine configuration, and the ordered list of
//! committed rules; every admission and validation goes through it.
//!
//! The session only changes in [`RuleSession::admit`], and only after the
//! repository has accepted the rule.

use jsre_core::{EngineConfig, ProposedRule, Rule, SchemaCompileError, SchemaNode, ValidationReport};
use jsre_schema::{infer, merged_schema, ValidationEngine};
use serde_json::Value;

use crate::lifecycle::{add_rule, RuleError};
use crate::store::RuleRepository;

/// Serialized merged schemas larger than this are logged as oversized.
pub const SCHEMA_SIZE_WARNING_BYTES: usize = 1024 * 1024;

/// Active rules plus the schema and configuration they apply to.
#[derive(Debug, Clone)]
pub struct RuleSession {
    base: SchemaNode,
    config: EngineConfig,
    rules: Vec<Rule>,
}

impl RuleSession {
    /// A session over an explicit structural schema.
    pub fn new(base: SchemaNode, config: EngineConfig) -> Self {
        Self {
            base,
            config,
            rules: Vec::new(),
        }
    }

    /// A session whose structural schema is inferred from `sample`.
    pub fn from_sample(sample: &Value, config: EngineConfig) -> Self {
        let base = infer(sample, &config);
        Self::new(base, config)
    }

    /// Restore rules committed in an earlier run. They are trusted as-is.
    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = rules;
        self
    }

    /// The structural schema.
    pub fn base(&self) -> &SchemaNode {
        &self.base
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Committed rules, in admission order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Run admission for `proposal` against `document` without changing
    /// the session.
    pub fn add_rule(&self, proposal: ProposedRule, document: &Value) -> Result<Rule, RuleError> {
        add_rule(proposal, document, &self.base, &self.rules, &self.config)
    }

    /// Admit `proposal`, persist it, and append it to the session.
    ///
    /// After the rule is saved the merged schema is upserted under the
    /// configured schema name. A failed upsert is logged and does not undo
    /// the commit.
    ///
    /// # Errors
    ///
    /// Any admission error, or [`RuleError::Store`] when the rule cannot be
    /// saved. On error the session is unchanged.
    pub fn admit<R: RuleRepository + ?Sized>(
        &mut self,
        proposal: ProposedRule,
        document: &Value,
        repo: &R,
    ) -> Result<Rule, RuleError> {
        let rule = self.add_rule(proposal, document)?;
        let saved = repo.save_rule(&rule)?;
        self.rules.push(saved.clone());
        self.publish_schema(repo);
        Ok(saved)
    }

    /// The structural schema merged with every committed rule.
    pub fn merged_schema(&self) -> SchemaNode {
        merged_schema(&self.base, &self.rules)
    }

    /// Compile an engine for the current rule set.
    pub fn engine(&self) -> Result<ValidationEngine, SchemaCompileError> {
        ValidationEngine::compile(self.merged_schema(), self.rules.clone(), &self.config)
    }

    /// Validate `document` against the current rule set.
    pub fn validate(&self, document: &Value) -> Result<ValidationReport, SchemaCompileError> {
        Ok(self.engine()?.validate(document))
    }

    fn publish_schema<R: RuleRepository + ?Sized>(&self, repo: &R) {
        let name = &self.config.schema_name;
        let document = match self.merged_schema().to_document() {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(schema = %name, error = %e, "cannot serialize merged schema");
                return;
            }
        };
        let size = document.to_string().len();
        if size > SCHEMA_SIZE_WARNING_BYTES {
            tracing::warn!(
                schema = %name,
                bytes = size,
                limit = SCHEMA_SIZE_WARNING_BYTES,
                "merged schema exceeds size limit"
            );
        }
        match repo.upsert_schema(name, document) {
            Ok(_) => tracing::debug!(schema = %name, bytes = size, "merged schema upserted"),
            Err(e) => tracing::warn!(schema = %name, error = %e, "merged schema upsert failed"),
        }
    }
}
