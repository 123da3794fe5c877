//! # jsre CLI entry point
//!
//! Parses command-line arguments, initializes logging, loads the engine
//! configuration, and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use jsre_cli::input::load_config;
use jsre_cli::schema::{run_fields, run_infer, FieldsArgs, InferArgs};
use jsre_cli::session::{run_session, SessionArgs};
use jsre_cli::validate::{run_validate, ValidateArgs};

/// JSON schema rule engine.
///
/// Infers structural schemas from sample documents, admits user rules
/// against a reference document, and validates documents against the
/// merged result.
#[derive(Parser, Debug)]
#[command(name = "jsre", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    /// `RUST_LOG` takes precedence when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    /// Path to the YAML engine configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the structural schema inferred from a sample document.
    Infer(InferArgs),

    /// List every dotted field path a schema declares.
    Fields(FieldsArgs),

    /// Validate documents against a schema and a rule set.
    Validate(ValidateArgs),

    /// Collect rules from standard input until `done`.
    Session(SessionArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);
    tracing::debug!("jsre CLI starting");

    let result = load_config(cli.config.as_deref()).and_then(|config| {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        match &cli.command {
            Commands::Infer(args) => run_infer(args, &config, &mut out),
            Commands::Fields(args) => run_fields(args, &config, &mut out),
            Commands::Validate(args) => run_validate(args, &config, &mut out),
            Commands::Session(args) => {
                run_session(args, &config, std::io::stdin().lock(), &mut out)
            }
        }
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
