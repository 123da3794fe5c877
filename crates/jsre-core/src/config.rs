//! # Engine Configuration
//!
//! Loaded from YAML. Every key is optional:
//!
//! ```yaml
//! schema_name: invoice
//! optional_fields:
//!   - purchaseOrderNumber
//! formats:
//!   uuid: true
//!   date: true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Field names exempt from required-ness unless configured otherwise.
pub const DEFAULT_OPTIONAL_FIELDS: &[&str] = &["purchaseOrderNumber"];

/// Name under which the merged schema is upserted unless configured otherwise.
pub const DEFAULT_SCHEMA_NAME: &str = "invoice";

/// Settings shared by inference, validation, and rule admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Schema record key used when persisting the merged schema.
    pub schema_name: String,
    /// The optional-exemption set.
    pub optional_fields: Vec<String>,
    /// Custom format assertions.
    pub formats: FormatConfig,
}

/// Which custom string formats are asserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Canonical 8-4-4-4-12 hex UUIDs.
    pub uuid: bool,
    /// Calendar-valid `YYYY-MM-DD` dates.
    pub date: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            uuid: true,
            date: true,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schema_name: DEFAULT_SCHEMA_NAME.to_string(),
            optional_fields: DEFAULT_OPTIONAL_FIELDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            formats: FormatConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Whether `name` is in the optional-exemption set.
    pub fn is_optional(&self, name: &str) -> bool {
        self.optional_fields.iter().any(|f| f == name)
    }

    /// Replace the optional-exemption set.
    pub fn with_optional_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.optional_fields = fields.into_iter().map(Into::into).collect();
        self
    }
}
