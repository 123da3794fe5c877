//! # jsre-core — Foundational Types for the Rule Engine
//!
//! Defines the type-system primitives shared by every other crate in the
//! workspace. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Documents are `serde_json::Value`.** The value enum is the tagged
//!    union `{Null, Bool, Number, String, Array, Object}`; every traversal
//!    matches it exhaustively instead of probing dynamic shapes.
//!
//! 2. **Schemas are typed.** [`SchemaNode`] always carries exactly one
//!    [`SchemaType`]. Rule-derived keywords live in [`Constraints`], which is
//!    flattened into the node on serialization.
//!
//! 3. **One canonical [`Rule`].** `message` is optional and `isValid`
//!    defaults to `false`, so every historical record shape deserializes.
//!
//! 4. **Paths are parsed once.** [`FieldPath`] rejects empty segments at
//!    construction; the [`path`] module resolves it in schema mode or data mode.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `jsre-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod config;
pub mod error;
pub mod path;
pub mod report;
pub mod rule;
pub mod schema;

pub use config::EngineConfig;
pub use error::{
    ConfigError, FieldNotFoundError, JsreError, OperatorMismatchError, RuleConflictError,
    RuleShapeError, SchemaCompileError, SchemaLoadError,
};
pub use path::{FieldPath, ResolutionMode, Resolved};
pub use report::{IssueSource, ValidationIssue, ValidationReport};
pub use rule::{Condition, ProposedRule, Rule, RuleInput};
pub use schema::{Constraints, Negation, SchemaNode, SchemaType};
