//! # Infer and Fields Subcommands
//!
//! `jsre infer sample.json` prints the structural schema inferred from a
//! sample document. `jsre fields --sample sample.json` (or `--schema`)
//! lists every dotted path the schema declares, one per line.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use jsre_core::EngineConfig;
use jsre_schema::infer;

use crate::input::{read_json, BaseSchemaArgs};

/// Arguments for the infer subcommand.
#[derive(Args, Debug)]
pub struct InferArgs {
    /// Sample document to infer from.
    pub sample: PathBuf,

    /// Print compact JSON instead of pretty-printed.
    #[arg(long)]
    pub compact: bool,
}

/// Arguments for the fields subcommand.
#[derive(Args, Debug)]
pub struct FieldsArgs {
    #[command(flatten)]
    pub base: BaseSchemaArgs,
}

/// Execute the infer subcommand.
pub fn run_infer(args: &InferArgs, config: &EngineConfig, out: &mut impl Write) -> Result<u8> {
    let sample = read_json(&args.sample)?;
    let document = infer(&sample, config).to_document()?;
    let rendered = if args.compact {
        serde_json::to_string(&document)?
    } else {
        serde_json::to_string_pretty(&document)?
    };
    writeln!(out, "{rendered}")?;
    Ok(0)
}

/// Execute the fields subcommand.
pub fn run_fields(args: &FieldsArgs, config: &EngineConfig, out: &mut impl Write) -> Result<u8> {
    let base = args.base.load(config)?;
    for path in base.field_paths() {
        writeln!(out, "{path}")?;
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn sample_file(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("sample.json");
        std::fs::write(
            &path,
            json!({"invoiceNumber": "INV-1", "purchaseOrderNumber": "PO-1", "totals": {"amountPaid": 5.0}})
                .to_string(),
        )
        .unwrap();
        path
    }

    #[test]
    fn infer_prints_the_structural_schema() {
        let dir = tempfile::tempdir().unwrap();
        let args = InferArgs {
            sample: sample_file(&dir),
            compact: true,
        };
        let mut out = Vec::new();
        assert_eq!(run_infer(&args, &EngineConfig::default(), &mut out).unwrap(), 0);
        let printed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(printed["type"], json!("object"));
        assert_eq!(printed["required"], json!(["invoiceNumber", "totals"]));
        assert_eq!(
            printed["properties"]["totals"]["properties"]["amountPaid"]["type"],
            json!("number")
        );
    }

    #[test]
    fn fields_lists_dotted_paths() {
        let dir = tempfile::tempdir().unwrap();
        let args = FieldsArgs {
            base: BaseSchemaArgs {
                sample: Some(sample_file(&dir)),
                schema: None,
            },
        };
        let mut out = Vec::new();
        run_fields(&args, &EngineConfig::default(), &mut out).unwrap();
        let printed = String::from_utf8(out).unwrap();
        assert_eq!(
            printed.lines().collect::<Vec<_>>(),
            vec!["invoiceNumber", "purchaseOrderNumber", "totals", "totals.amountPaid"]
        );
    }
}
