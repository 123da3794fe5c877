//! # jsre-cli — Rule Engine Command-Line Interface
//!
//! A clap-based CLI over the rule engine crates.
//!
//! ## Subcommands
//!
//! - `infer` — print the structural schema of a sample document
//! - `fields` — list every dotted path a schema declares
//! - `validate` — validate documents against a schema and a rule set
//! - `session` — collect rules line by line until `done`, admitting each
//!   against a reference document and persisting it
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the handlers.
//! - Handlers delegate to the domain crates and return an exit code.
//! - `anyhow` is used here and nowhere else in the workspace.

pub mod input;
pub mod repository;
pub mod schema;
pub mod session;
pub mod validate;
