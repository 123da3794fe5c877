//! # Session Subcommand
//!
//! Collects rules interactively. Each input line is either
//! `field condition value` or `done` (any case). Every proposal is run
//! through admission against the reference document; admitted rules are
//! saved to the repository and the merged schema is upserted after each
//! commit. Rejections are reported and collection continues.
//!
//! ```text
//! $ jsre session --sample fixtures/sample_invoice.json --repository rules.json
//! totals.amountPaid > 500
//! accepted 5f0c…: totals.amountPaid > 500
//! totals.amountPaid < 500
//! rejected: rule 9a1e… conflicts with the reference document: …
//! done
//! 1 rule(s) committed
//! ```

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use jsre_core::{EngineConfig, RuleInput};
use jsre_rules::{InMemoryRepository, RuleRepository, RuleSession};
use serde_json::Value;

use crate::input::{read_json, BaseSchemaArgs};
use crate::repository::JsonFileRepository;

/// Arguments for the session subcommand.
#[derive(Args, Debug)]
pub struct SessionArgs {
    /// Reference document every rule is trial-validated against.
    #[arg(long)]
    pub document: Option<PathBuf>,

    #[command(flatten)]
    pub base: BaseSchemaArgs,

    /// Repository file. Without one, rules live only for this run.
    #[arg(long)]
    pub repository: Option<PathBuf>,

    /// Start from the rules already stored in the repository.
    #[arg(long, requires = "repository")]
    pub resume: bool,
}

/// Execute the session subcommand, reading lines from `input`.
pub fn run_session(
    args: &SessionArgs,
    config: &EngineConfig,
    input: impl BufRead,
    out: &mut impl Write,
) -> Result<u8> {
    let document = match (&args.document, &args.base.sample) {
        (Some(path), _) | (None, Some(path)) => read_json(path)?,
        (None, None) => anyhow::bail!("--document is required when the schema is not inferred"),
    };
    let base = args.base.load(config)?;
    let session = RuleSession::new(base, config.clone());

    match &args.repository {
        Some(path) => {
            let repo = JsonFileRepository::new(path);
            let session = if args.resume {
                let stored = repo
                    .list_rules()
                    .with_context(|| format!("reading rules from {}", path.display()))?;
                session.with_rules(stored)
            } else {
                session
            };
            collect(session, &document, &repo, input, out)
        }
        None => collect(session, &document, &InMemoryRepository::new(), input, out),
    }
}

/// Feed input lines to `session` until `done` or end of input.
pub fn collect<R: RuleRepository + ?Sized>(
    mut session: RuleSession,
    document: &Value,
    repo: &R,
    input: impl BufRead,
    out: &mut impl Write,
) -> Result<u8> {
    let restored = session.rules().len();
    for line in input.lines() {
        let line = line.context("reading rule input")?;
        if line.trim().is_empty() {
            continue;
        }
        let proposal = match RuleInput::parse(&line) {
            Ok(RuleInput::Done) => break,
            Ok(RuleInput::Rule(proposal)) => proposal,
            Err(e) => {
                writeln!(out, "rejected: {e}")?;
                continue;
            }
        };
        match session.admit(proposal, document, repo) {
            Ok(rule) => writeln!(out, "accepted {}: {rule}", rule.id)?,
            Err(e) => writeln!(out, "rejected: {e}")?,
        }
    }
    let committed = session.rules().len() - restored;
    writeln!(out, "{committed} rule(s) committed")?;
    tracing::info!(committed, total = session.rules().len(), "rule session finished");
    Ok(0)
}
