//! # Rule and Schema Repository
//!
//! Committed rules and the merged schema are handed to a repository. The
//! engine only needs four operations, captured by [`RuleRepository`].
//! Calls are blocking and are never retried: a failed `save_rule` leaves
//! the rule uncommitted and the caller re-runs admission.
//!
//! [`InMemoryRepository`] backs tests and one-shot CLI runs. The CLI adds a
//! JSON-file implementation.

use std::collections::BTreeMap;

use jsre_core::Rule;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A named schema document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaRecord {
    /// Record key, e.g. `invoice`.
    pub name: String,
    /// The schema document.
    pub content: Value,
}

/// Errors from a repository backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend refused or could not complete the operation.
    #[error("repository unavailable: {reason}")]
    Unavailable {
        /// Human-readable reason.
        reason: String,
    },

    /// A stored record could not be read or written as JSON.
    #[error("repository serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error from a file-backed repository.
    #[error("repository io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persistence for committed rules and the merged schema.
///
/// Implementations must be `Send + Sync` so one repository can serve
/// several sessions. The trait is object-safe.
pub trait RuleRepository: Send + Sync {
    /// Persist a committed rule and return the stored form.
    fn save_rule(&self, rule: &Rule) -> Result<Rule, StoreError>;

    /// Fetch a schema record by name.
    fn get_schema(&self, name: &str) -> Result<Option<SchemaRecord>, StoreError>;

    /// Create or replace a schema record.
    fn upsert_schema(&self, name: &str, content: Value) -> Result<SchemaRecord, StoreError>;

    /// Every stored rule, in save order.
    fn list_rules(&self) -> Result<Vec<Rule>, StoreError>;
}

#[derive(Debug, Default)]
struct Records {
    rules: Vec<Rule>,
    schemas: BTreeMap<String, SchemaRecord>,
}

/// Process-local repository.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    records: Mutex<Records>,
}

impl InMemoryRepository {
    /// An empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rules.
    pub fn rule_count(&self) -> usize {
        self.records.lock().rules.len()
    }
}

impl RuleRepository for InMemoryRepository {
    fn save_rule(&self, rule: &Rule) -> Result<Rule, StoreError> {
        let mut records = self.records.lock();
        match records.rules.iter_mut().find(|r| r.id == rule.id) {
            Some(existing) => *existing = rule.clone(),
            None => records.rules.push(rule.clone()),
        }
        Ok(rule.clone())
    }

    fn get_schema(&self, name: &str) -> Result<Option<SchemaRecord>, StoreError> {
        Ok(self.records.lock().schemas.get(name).cloned())
    }

    fn upsert_schema(&self, name: &str, content: Value) -> Result<SchemaRecord, StoreError> {
        let record = SchemaRecord {
            name: name.to_string(),
            content,
        };
        self.records
            .lock()
            .schemas
            .insert(name.to_string(), record.clone());
        Ok(record)
    }

    fn list_rules(&self) -> Result<Vec<Rule>, StoreError> {
        Ok(self.records.lock().rules.clone())
    }
}
