//! # Validate Subcommand
//!
//! Validates one or more documents against a structural schema merged with
//! a rule set. Rules come from a JSON array file (`--rules`), a repository
//! file (`--repository`), or both, in that order.
//!
//! Exit code is 0 when every document is valid and 1 otherwise.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use jsre_core::{EngineConfig, Rule};
use jsre_rules::RuleRepository;
use jsre_schema::ValidationEngine;

use crate::input::{read_json, BaseSchemaArgs};
use crate::repository::JsonFileRepository;

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub base: BaseSchemaArgs,

    /// JSON file holding an array of rule records.
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Repository file whose stored rules are applied.
    #[arg(long)]
    pub repository: Option<PathBuf>,

    /// Print each report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Documents to validate.
    #[arg(required = true)]
    pub documents: Vec<PathBuf>,
}

/// Execute the validate subcommand.
pub fn run_validate(
    args: &ValidateArgs,
    config: &EngineConfig,
    out: &mut impl Write,
) -> Result<u8> {
    let base = args.base.load(config)?;
    let rules = collect_rules(args)?;
    tracing::info!(rules = rules.len(), documents = args.documents.len(), "validating");
    let engine = ValidationEngine::from_base(&base, rules, config)?;

    let mut all_valid = true;
    for path in &args.documents {
        let report = engine.validate(&read_json(path)?);
        all_valid &= report.is_valid();
        if args.json {
            writeln!(
                out,
                "{}",
                serde_json::json!({"document": path.display().to_string(), "report": report})
            )?;
        } else if report.is_valid() {
            writeln!(out, "{}: valid", path.display())?;
        } else {
            writeln!(out, "{}: {} issue(s)", path.display(), report.len())?;
            for issue in report.issues() {
                writeln!(out, "  {issue}")?;
            }
        }
    }
    Ok(if all_valid { 0 } else { 1 })
}

fn collect_rules(args: &ValidateArgs) -> Result<Vec<Rule>> {
    let mut rules = Vec::new();
    if let Some(path) = &args.rules {
        let listed: Vec<Rule> = serde_json::from_value(read_json(path)?)
            .with_context(|| format!("{} is not an array of rules", path.display()))?;
        rules.extend(listed);
    }
    if let Some(path) = &args.repository {
        let stored = JsonFileRepository::new(path)
            .list_rules()
            .with_context(|| format!("reading rules from {}", path.display()))?;
        rules.extend(stored);
    }
    Ok(rules)
}
