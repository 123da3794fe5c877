//! # jsre-schema — Inference, Compilation, Merging, Validation
//!
//! The synchronous, side-effect-free half of the rule engine.
//!
//! ## Pipeline
//!
//! ```text
//! sample document ──infer()──▶ base schema ─┐
//!                                           ├─merge()──▶ merged schema ──compile──▶ ValidationEngine
//! active rules ──compile_rules()──▶ rule schema ┘                                        │
//!                                                                         validate(document)
//!                                                                                        ▼
//!                                                             schema issues ++ rule issues
//! ```
//!
//! - [`infer`] derives a structural schema from a sample document.
//! - [`compile`] turns rules into constraint fragments and a rule schema.
//! - [`merge`] overlays the rule schema onto the structural schema.
//! - [`refs`] expands local `$ref`s once, at load time.
//! - [`compare`] evaluates each rule directly against live document values.
//! - [`validate`] compiles a merged schema once and validates documents
//!   repeatedly; [`SharedValidator`] swaps engines under a lock.
//!
//! ## Crate Policy
//!
//! - Depends only on `jsre-core` internally.
//! - Nothing here performs IO except [`refs::load_schema_file`].
//! - Document validation never returns `Err`; every issue is reported.

pub mod compare;
pub mod compile;
pub mod formats;
pub mod infer;
pub mod merge;
pub mod refs;
pub mod validate;

pub use compare::{check_rule, check_rules};
pub use compile::{compile, compile_for, compile_rules, CompileError};
pub use infer::infer;
pub use merge::{merge, merged_schema};
pub use refs::{expand_refs, load_schema, load_schema_file};
pub use validate::{SharedValidator, ValidationEngine};
