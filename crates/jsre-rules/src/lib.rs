//! # jsre-rules — Rule Admission
//!
//! Decides whether a proposed rule may join the active rule set.
//!
//! ## Modules
//!
//! - **Lifecycle** (`lifecycle.rs`): the admission guard as a typestate
//!   machine, `Proposed → ShapeValidated → FieldResolved → TrialValidated →
//!   Committed`, with `Rejected` reachable from every non-terminal state.
//!   A candidate in `Proposed` has no `.commit()` method; skipping the trial
//!   validation is a compile error.
//!
//! - **Session** (`session.rs`): the explicit context carrying the active
//!   rules, the structural schema, and the engine configuration through
//!   `add_rule` and `validate` calls. There is no process-wide rule list.
//!
//! - **Store** (`store.rs`): the repository contract used to persist
//!   committed rules and the merged schema, with an in-memory
//!   implementation.

pub mod lifecycle;
pub mod session;
pub mod store;

// ─── Lifecycle re-exports ───────────────────────────────────────────

pub use lifecycle::{
    add_rule, CandidateState, Committed, FieldResolved, Proposed, Rejected, RuleCandidate,
    RuleError, RuleState, ShapeValidated, TransitionRecord, TrialValidated,
};

// ─── Session and store re-exports ───────────────────────────────────

pub use session::RuleSession;
pub use store::{InMemoryRepository, RuleRepository, SchemaRecord, StoreError};
