//! # JSON File Repository
//!
//! A [`RuleRepository`] persisted as one JSON file:
//!
//! ```json
//! {
//!   "rules": [{"id": "…", "field": "totals.amountPaid", "condition": ">", "value": "500", "isValid": true}],
//!   "schemas": {"invoice": {"name": "invoice", "content": {"type": "object"}}}
//! }
//! ```
//!
//! Every operation re-reads the file, so several processes see each
//! other's commits. Writes go to a sibling temporary file that is renamed
//! over the original. A missing file reads as empty.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use jsre_core::Rule;
use jsre_rules::{RuleRepository, SchemaRecord, StoreError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Default, Serialize, Deserialize)]
struct RepositoryFile {
    #[serde(default)]
    rules: Vec<Rule>,
    #[serde(default)]
    schemas: BTreeMap<String, SchemaRecord>,
}

/// Rules and schemas in a single JSON file.
#[derive(Debug)]
pub struct JsonFileRepository {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileRepository {
    /// A repository at `path`. The file is created on the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<RepositoryFile, StoreError> {
        if !self.path.exists() {
            return Ok(RepositoryFile::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(RepositoryFile::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write(&self, file: &RepositoryFile) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(file)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn modify<T>(
        &self,
        change: impl FnOnce(&mut RepositoryFile) -> T,
    ) -> Result<T, StoreError> {
        let _guard = self.write_lock.lock();
        let mut file = self.read()?;
        let out = change(&mut file);
        self.write(&file)?;
        Ok(out)
    }
}

impl RuleRepository for JsonFileRepository {
    fn save_rule(&self, rule: &Rule) -> Result<Rule, StoreError> {
        self.modify(|file| {
            match file.rules.iter_mut().find(|r| r.id == rule.id) {
                Some(existing) => *existing = rule.clone(),
                None => file.rules.push(rule.clone()),
            }
            rule.clone()
        })
    }

    fn get_schema(&self, name: &str) -> Result<Option<SchemaRecord>, StoreError> {
        Ok(self.read()?.schemas.remove(name))
    }

    fn upsert_schema(&self, name: &str, content: Value) -> Result<SchemaRecord, StoreError> {
        let record = SchemaRecord {
            name: name.to_string(),
            content,
        };
        self.modify(|file| {
            file.schemas.insert(name.to_string(), record.clone());
        })?;
        tracing::debug!(schema = %name, path = %self.path.display(), "schema record written");
        Ok(record)
    }

    fn list_rules(&self) -> Result<Vec<Rule>, StoreError> {
        Ok(self.read()?.rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsre_core::Condition;
    use serde_json::json;

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("store.json"));
        assert!(repo.list_rules().unwrap().is_empty());
        assert!(repo.get_schema("invoice").unwrap().is_none());
    }

    #[test]
    fn records_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        {
            let repo = JsonFileRepository::new(&path);
            repo.save_rule(&Rule::new("x", Condition::Gt, "1").with_id("a"))
                .unwrap();
            repo.upsert_schema("invoice", json!({"type": "object"}))
                .unwrap();
        }
        let repo = JsonFileRepository::new(&path);
        let rules = repo.list_rules().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id, "a");
        assert_eq!(
            repo.get_schema("invoice").unwrap().unwrap().content,
            json!({"type": "object"})
        );
        assert!(!dir.path().join("store.json.tmp").exists());
    }

    #[test]
    fn file_uses_camel_case_rule_records() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("store.json"));
        let mut rule = Rule::new("totals.amountPaid", Condition::Gt, "500").with_id("r1");
        rule.is_valid = true;
        repo.save_rule(&rule).unwrap();

        let raw: Value =
            serde_json::from_str(&std::fs::read_to_string(repo.path()).unwrap()).unwrap();
        assert_eq!(raw["rules"][0]["isValid"], json!(true));
        assert_eq!(raw["rules"][0]["condition"], json!(">"));
    }

    #[test]
    fn legacy_records_without_is_valid_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(
            &path,
            r#"{"rules": [{"id": "old", "field": "x", "condition": "==", "value": "1"}]}"#,
        )
        .unwrap();
        let rules = JsonFileRepository::new(&path).list_rules().unwrap();
        assert!(!rules[0].is_valid);
        assert!(rules[0].message.is_none());
    }

    #[test]
    fn corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "[1, 2").unwrap();
        let err = JsonFileRepository::new(&path).list_rules().unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
