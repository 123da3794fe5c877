//! # Rule Lifecycle Typestate Machine
//!
//! Implements the rule admission guard using the typestate pattern. Each
//! admission stage is a distinct type, so a rule cannot reach `Committed`
//! without passing every check in order.
//!
//! ## States
//!
//! - `Proposed` → raw input, nothing checked.
//! - `ShapeValidated` → field, condition, and value are well formed; the
//!   operator suits the value and the id is unused.
//! - `FieldResolved` → the field resolves in the structural schema and in
//!   the reference document.
//! - `TrialValidated` → active rules plus the candidate accept the
//!   reference document.
//! - `Committed` → terminal, `isValid` is set.
//! - `Rejected` → terminal, carries the [`RuleError`] that ended admission.
//!
//! ## Allowed Transitions
//!
//! ```text
//! Proposed ──check_shape()──▶ ShapeValidated ──resolve_field()──▶ FieldResolved
//!    │                              │                                  │
//!    │                              │                             trial()
//!    ▼                              ▼                                  ▼
//! Rejected ◀────────────────── Rejected ◀──────────────────────── TrialValidated
//!                                                                      │
//!                                                                 commit()
//!                                                                      ▼
//!                                                                  Committed
//! ```
//!
//! Fallible transitions return `Result<RuleCandidate<Next>, RuleCandidate<Rejected>>`.
//! `Committed` and `Rejected` define no transition methods.
//!
//! ## Compile-Time Safety Example
//!
//! ```compile_fail
//! use jsre_core::ProposedRule;
//! use jsre_rules::lifecycle::RuleCandidate;
//!
//! let candidate = RuleCandidate::new(ProposedRule::new("totals.amountPaid", ">", "500"));
//! // ERROR: no method named `commit` found for `RuleCandidate<Proposed>`
//! let _committed = candidate.commit();
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use jsre_core::path::{resolve_data, resolve_schema};
use jsre_core::{
    EngineConfig, FieldNotFoundError, FieldPath, OperatorMismatchError, ProposedRule,
    ResolutionMode, Rule, RuleConflictError, RuleShapeError, SchemaCompileError, SchemaNode,
};
use jsre_schema::{infer, ValidationEngine};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::store::StoreError;

// ─── State Types ─────────────────────────────────────────────────────

/// Candidate state: raw input.
#[derive(Debug, Clone)]
pub struct Proposed {
    proposal: ProposedRule,
}

/// Candidate state: well-formed rule.
#[derive(Debug, Clone)]
pub struct ShapeValidated {
    rule: Rule,
    path: FieldPath,
}

/// Candidate state: field exists in schema and document.
#[derive(Debug, Clone)]
pub struct FieldResolved {
    rule: Rule,
}

/// Candidate state: reference document passes with the candidate active.
#[derive(Debug, Clone)]
pub struct TrialValidated {
    rule: Rule,
}

/// Candidate state: admitted (terminal).
#[derive(Debug, Clone)]
pub struct Committed {
    rule: Rule,
}

/// Candidate state: refused (terminal).
#[derive(Debug)]
pub struct Rejected {
    error: RuleError,
}

// ─── Sealed Trait ────────────────────────────────────────────────────

mod private {
    pub trait Sealed {}
    impl Sealed for super::Proposed {}
    impl Sealed for super::ShapeValidated {}
    impl Sealed for super::FieldResolved {}
    impl Sealed for super::TrialValidated {}
    impl Sealed for super::Committed {}
    impl Sealed for super::Rejected {}
}

/// Marker trait for the six admission states. Sealed.
pub trait CandidateState: private::Sealed + fmt::Debug {
    /// The runtime mirror of this state.
    const STATE: RuleState;

    /// Whether this state is terminal.
    fn is_terminal() -> bool {
        Self::STATE.is_terminal()
    }
}

impl CandidateState for Proposed {
    const STATE: RuleState = RuleState::Proposed;
}
impl CandidateState for ShapeValidated {
    const STATE: RuleState = RuleState::ShapeValidated;
}
impl CandidateState for FieldResolved {
    const STATE: RuleState = RuleState::FieldResolved;
}
impl CandidateState for TrialValidated {
    const STATE: RuleState = RuleState::TrialValidated;
}
impl CandidateState for Committed {
    const STATE: RuleState = RuleState::Committed;
}
impl CandidateState for Rejected {
    const STATE: RuleState = RuleState::Rejected;
}

// ─── RuleState — Runtime Mirror ──────────────────────────────────────

/// Runtime representation of an admission state, used in transition
/// records and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleState {
    /// Raw input.
    Proposed,
    /// Well-formed rule.
    ShapeValidated,
    /// Field exists in schema and document.
    FieldResolved,
    /// Reference document passes with the candidate active.
    TrialValidated,
    /// Admitted.
    Committed,
    /// Refused.
    Rejected,
}

impl RuleState {
    /// Returns the canonical state name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Proposed => "PROPOSED",
            Self::ShapeValidated => "SHAPE_VALIDATED",
            Self::FieldResolved => "FIELD_RESOLVED",
            Self::TrialValidated => "TRIAL_VALIDATED",
            Self::Committed => "COMMITTED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::Rejected)
    }

    /// Whether the machine allows moving from `self` to `to`.
    pub fn can_transition_to(&self, to: RuleState) -> bool {
        match (self, to) {
            (Self::Proposed, Self::ShapeValidated)
            | (Self::ShapeValidated, Self::FieldResolved)
            | (Self::FieldResolved, Self::TrialValidated)
            | (Self::TrialValidated, Self::Committed) => true,
            (Self::Proposed | Self::ShapeValidated | Self::FieldResolved, Self::Rejected) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Transition Record ───────────────────────────────────────────────

/// One step of a candidate's admission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// State before the transition.
    pub from_state: RuleState,
    /// State after the transition.
    pub to_state: RuleState,
    /// When the transition occurred (UTC).
    pub timestamp: DateTime<Utc>,
    /// Why the transition happened, for rejections.
    pub reason: Option<String>,
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Why a rule was not admitted.
#[derive(Error, Debug)]
pub enum RuleError {
    /// Malformed rule input.
    #[error(transparent)]
    Shape(#[from] RuleShapeError),

    /// Relational operator with a non-numeric value.
    #[error(transparent)]
    OperatorMismatch(#[from] OperatorMismatchError),

    /// The field does not resolve.
    #[error(transparent)]
    FieldNotFound(#[from] FieldNotFoundError),

    /// The candidate invalidates the reference document.
    #[error(transparent)]
    Conflict(#[from] RuleConflictError),

    /// The trial schema could not be compiled.
    #[error(transparent)]
    SchemaCompile(#[from] SchemaCompileError),

    /// The committed rule could not be persisted.
    #[error("rule store error: {0}")]
    Store(#[from] StoreError),
}

// ─── The Candidate ───────────────────────────────────────────────────

/// A rule moving through admission, parameterized by its state.
#[derive(Debug)]
pub struct RuleCandidate<S: CandidateState> {
    state: S,
    transition_log: Vec<TransitionRecord>,
}

impl<S: CandidateState> RuleCandidate<S> {
    /// The runtime state.
    pub fn state(&self) -> RuleState {
        S::STATE
    }

    /// Whether the candidate is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        S::is_terminal()
    }

    /// Every transition so far, oldest first.
    pub fn transition_log(&self) -> &[TransitionRecord] {
        &self.transition_log
    }

    fn advance<T: CandidateState>(mut self, next: T, reason: Option<String>) -> RuleCandidate<T> {
        debug_assert!(S::STATE.can_transition_to(T::STATE));
        self.transition_log.push(TransitionRecord {
            from_state: S::STATE,
            to_state: T::STATE,
            timestamp: Utc::now(),
            reason,
        });
        RuleCandidate {
            state: next,
            transition_log: self.transition_log,
        }
    }

    fn reject(self, error: impl Into<RuleError>) -> RuleCandidate<Rejected> {
        let error = error.into();
        let state = S::STATE;
        tracing::warn!(state = %state, error = %error, "rule rejected");
        let reason = Some(error.to_string());
        self.advance(Rejected { error }, reason)
    }
}

impl RuleCandidate<Proposed> {
    /// Start admission for `proposal`.
    pub fn new(proposal: ProposedRule) -> Self {
        Self {
            state: Proposed { proposal },
            transition_log: Vec::new(),
        }
    }

    /// Check shape, operator fit, and id uniqueness against `active`.
    pub fn check_shape(
        self,
        active: &[Rule],
    ) -> Result<RuleCandidate<ShapeValidated>, RuleCandidate<Rejected>> {
        let (rule, path) = match self.state.proposal.clone().into_rule() {
            Ok(parsed) => parsed,
            Err(e) => return Err(self.reject(e)),
        };
        if let Err(e) = rule.check_operator() {
            return Err(self.reject(e));
        }
        if active.iter().any(|r| r.id == rule.id) {
            return Err(self.reject(RuleShapeError::DuplicateId(rule.id)));
        }
        tracing::debug!(rule = %rule, "rule shape accepted");
        Ok(self.advance(ShapeValidated { rule, path }, None))
    }
}

impl RuleCandidate<ShapeValidated> {
    /// The parsed rule.
    pub fn rule(&self) -> &Rule {
        &self.state.rule
    }

    /// Require the field in the structural schema inferred from `document`
    /// and in `document` itself.
    ///
    /// The session's base schema plays no part here; it may be authored or
    /// inferred from another sample.
    pub fn resolve_field(
        self,
        document: &Value,
        config: &EngineConfig,
    ) -> Result<RuleCandidate<FieldResolved>, RuleCandidate<Rejected>> {
        let path = &self.state.path;
        let structural = infer(document, config);
        if resolve_schema(&structural, path).is_none() {
            let error = FieldNotFoundError {
                field: path.as_str().to_string(),
                mode: ResolutionMode::Schema,
                suggestion: suggest(path.as_str(), &structural.field_paths()),
            };
            return Err(self.reject(error));
        }
        if resolve_data(document, path).is_none() {
            let error = FieldNotFoundError {
                field: path.as_str().to_string(),
                mode: ResolutionMode::Data,
                suggestion: None,
            };
            return Err(self.reject(error));
        }
        let rule = self.state.rule.clone();
        Ok(self.advance(FieldResolved { rule }, None))
    }
}

impl RuleCandidate<FieldResolved> {
    /// The parsed rule.
    pub fn rule(&self) -> &Rule {
        &self.state.rule
    }

    /// Validate `document` against `base` merged with `active` plus the
    /// candidate. Any issue at all rejects the candidate.
    pub fn trial(
        self,
        document: &Value,
        base: &SchemaNode,
        active: &[Rule],
        config: &EngineConfig,
    ) -> Result<RuleCandidate<TrialValidated>, RuleCandidate<Rejected>> {
        let mut rules = active.to_vec();
        rules.push(self.state.rule.clone());
        let engine = match ValidationEngine::from_base(base, rules, config) {
            Ok(engine) => engine,
            Err(e) => return Err(self.reject(e)),
        };
        let report = engine.validate(document);
        if !report.is_valid() {
            let error = RuleConflictError {
                rule_id: self.state.rule.id.clone(),
                issues: report.into_inner(),
            };
            return Err(self.reject(error));
        }
        let rule = self.state.rule.clone();
        Ok(self.advance(TrialValidated { rule }, None))
    }
}

impl RuleCandidate<TrialValidated> {
    /// Mark the rule valid (terminal).
    pub fn commit(self) -> RuleCandidate<Committed> {
        let mut rule = self.state.rule.clone();
        rule.is_valid = true;
        self.advance(Committed { rule }, None)
    }
}

impl RuleCandidate<Committed> {
    /// The admitted rule.
    pub fn rule(&self) -> &Rule {
        &self.state.rule
    }

    /// Take the admitted rule.
    pub fn into_rule(self) -> Rule {
        self.state.rule
    }
}

impl RuleCandidate<Rejected> {
    /// Why admission ended.
    pub fn error(&self) -> &RuleError {
        &self.state.error
    }

    /// Take the error.
    pub fn into_error(self) -> RuleError {
        self.state.error
    }
}

// ─── Admission ───────────────────────────────────────────────────────

/// Run a proposal through every admission check.
///
/// The field must resolve in the structural schema inferred from
/// `document`. `base` is the schema the rules are merged into for the trial
/// run; `active` the rules already in force. On success the returned rule has `is_valid == true`.
///
/// # Errors
///
/// The first failing check, in order: [`RuleError::Shape`] or
/// [`RuleError::OperatorMismatch`], then [`RuleError::FieldNotFound`], then
/// [`RuleError::Conflict`] (or [`RuleError::SchemaCompile`]).
pub fn add_rule(
    proposal: ProposedRule,
    document: &Value,
    base: &SchemaNode,
    active: &[Rule],
    config: &EngineConfig,
) -> Result<Rule, RuleError> {
    let committed = RuleCandidate::new(proposal)
        .check_shape(active)
        .and_then(|c| c.resolve_field(document, config))
        .and_then(|c| c.trial(document, base, active, config))
        .map(RuleCandidate::commit)
        .map_err(RuleCandidate::into_error)?;
    tracing::info!(
        rule_id = %committed.rule().id,
        rule = %committed.rule(),
        transitions = committed.transition_log().len(),
        "rule committed"
    );
    Ok(committed.into_rule())
}

/// The declared path sharing the longest prefix with `field`.
fn suggest(field: &str, declared: &[String]) -> Option<String> {
    declared
        .iter()
        .map(|candidate| {
            let shared = field
                .chars()
                .zip(candidate.chars())
                .take_while(|(a, b)| a == b)
                .count();
            (shared, candidate)
        })
        .filter(|(shared, _)| *shared > 0)
        .max_by_key(|(shared, _)| *shared)
        .map(|(_, candidate)| candidate.clone())
}
