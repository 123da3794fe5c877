//! Loading of configuration, documents, and base schemas from disk.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use jsre_core::{EngineConfig, SchemaNode};
use jsre_schema::{infer, load_schema_file};
use serde_json::Value;

/// Where the structural schema comes from.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct BaseSchemaArgs {
    /// Infer the structural schema from this sample document.
    #[arg(long)]
    pub sample: Option<std::path::PathBuf>,

    /// Load the structural schema from this JSON schema file (`$ref`s are expanded).
    #[arg(long)]
    pub schema: Option<std::path::PathBuf>,
}

impl BaseSchemaArgs {
    /// Build the structural schema.
    pub fn load(&self, config: &EngineConfig) -> Result<SchemaNode> {
        match (&self.sample, &self.schema) {
            (_, Some(schema)) => load_schema_file(schema)
                .with_context(|| format!("loading schema {}", schema.display())),
            (Some(sample), None) => Ok(infer(&read_json(sample)?, config)),
            (None, None) => anyhow::bail!("either --sample or --schema is required"),
        }
    }
}

/// Load the engine configuration, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

/// Read and parse a JSON file.
pub fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sample_base_is_inferred() {
        let dir = tempfile::tempdir().unwrap();
        let sample = dir.path().join("sample.json");
        std::fs::write(&sample, r#"{"totals": {"amountPaid": 1.5}}"#).unwrap();
        let args = BaseSchemaArgs {
            sample: Some(sample),
            schema: None,
        };
        let base = args.load(&EngineConfig::default()).unwrap();
        assert_eq!(base.field_paths(), vec!["totals", "totals.amountPaid"]);
    }

    #[test]
    fn schema_base_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("schema.json");
        let doc = json!({
            "type": "object",
            "properties": {"a": {"type": "string"}, "b": {"$ref": "#/properties/a"}}
        });
        std::fs::write(&schema, doc.to_string()).unwrap();
        let args = BaseSchemaArgs {
            sample: None,
            schema: Some(schema),
        };
        let base = args.load(&EngineConfig::default()).unwrap();
        assert_eq!(base.field_paths(), vec!["a", "b"]);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        assert!(load_config(Some(Path::new("/nonexistent/jsre.yaml"))).is_err());
        assert_eq!(load_config(None).unwrap(), EngineConfig::default());
    }

    #[test]
    fn unreadable_json_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{").unwrap();
        let err = read_json(&path).unwrap_err();
        assert!(format!("{err:#}").contains("broken.json"));
    }
}
