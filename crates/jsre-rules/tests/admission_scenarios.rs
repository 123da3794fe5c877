//! Integration test: end-to-end admission and validation through a
//! `RuleSession`, against small documents and the sample invoice fixture.

use std::path::PathBuf;

use jsre_core::{EngineConfig, IssueSource, ProposedRule, ResolutionMode, RuleInput};
use jsre_rules::{InMemoryRepository, RuleError, RuleRepository, RuleSession};
use serde_json::{json, Value};

fn sample_invoice() -> Value {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.pop(); // crates/
    path.pop(); // repo root
    let content = std::fs::read_to_string(path.join("fixtures").join("sample_invoice.json"))
        .expect("sample invoice fixture should be readable");
    serde_json::from_str(&content).expect("sample invoice fixture should be JSON")
}

fn rule_ids(report: &jsre_core::ValidationReport) -> Vec<String> {
    report
        .rule_issues()
        .filter_map(|issue| match &issue.source {
            IssueSource::Rule { rule_id } => Some(rule_id.clone()),
            IssueSource::Schema => None,
        })
        .collect()
}

#[test]
fn satisfied_rule_yields_no_errors() {
    let doc = json!({"totals": {"amountPaid": 205011.64}});
    let repo = InMemoryRepository::new();
    let mut session = RuleSession::from_sample(&doc, EngineConfig::default());
    session
        .admit(ProposedRule::new("totals.amountPaid", ">", "500"), &doc, &repo)
        .unwrap();
    let report = session.validate(&doc).unwrap();
    assert!(report.is_valid(), "{report}");
}

#[test]
fn conflicting_rule_is_never_committed() {
    let doc = json!({"totals": {"amountPaid": 205011.64}});
    let repo = InMemoryRepository::new();
    let mut session = RuleSession::from_sample(&doc, EngineConfig::default());
    let err = session
        .admit(ProposedRule::new("totals.amountPaid", "<", "500"), &doc, &repo)
        .unwrap_err();
    assert!(matches!(err, RuleError::Conflict(_)), "{err}");
    assert!(session.rules().is_empty());
    assert!(repo.list_rules().unwrap().is_empty());
}

#[test]
fn unknown_field_fails_before_trial_validation() {
    let doc = json!({"totals": {"amountPaid": 205011.64}});
    let session = RuleSession::from_sample(&doc, EngineConfig::default());
    match session
        .add_rule(ProposedRule::new("totals.nonexistent", "==", "1"), &doc)
        .unwrap_err()
    {
        RuleError::FieldNotFound(e) => {
            assert_eq!(e.field, "totals.nonexistent");
            assert_eq!(e.mode, ResolutionMode::Schema);
        }
        other => panic!("expected FieldNotFound, got {other:?}"),
    }
}

#[test]
fn later_violations_follow_rule_order() {
    let admitted_at = json!({"x": 150});
    let repo = InMemoryRepository::new();
    let mut session = RuleSession::from_sample(&admitted_at, EngineConfig::default());
    let above = session
        .admit(ProposedRule::new("x", ">", "100"), &admitted_at, &repo)
        .unwrap();
    let below = session
        .admit(ProposedRule::new("x", "<", "200"), &admitted_at, &repo)
        .unwrap();
    assert_eq!(session.rules().len(), 2);
    assert_eq!(session.rules()[0].id, above.id);

    let report = session.validate(&json!({"x": 250})).unwrap();
    assert_eq!(rule_ids(&report), vec![below.id.clone()]);
    assert_eq!(report.schema_issues().count(), 1, "{report}");
    assert!(report.issues()[0].source == IssueSource::Schema);

    let report = session.validate(&json!({"x": 50})).unwrap();
    assert_eq!(rule_ids(&report), vec![above.id]);
}

#[test]
fn invoice_rules_from_input_lines() {
    let invoice = sample_invoice();
    let repo = InMemoryRepository::new();
    let mut session = RuleSession::from_sample(&invoice, EngineConfig::default());

    let lines = [
        "totals.amountPaid > 500",
        "billingCurrency == USD;",
        "terms != Net 30",
        "receivable.supplier.address.postCode == 64116",
        "DONE",
        "totals.taxTotal < 1",
    ];
    for line in lines {
        match RuleInput::parse(line).unwrap() {
            RuleInput::Done => break,
            RuleInput::Rule(proposal) => {
                session.admit(proposal, &invoice, &repo).unwrap();
            }
        }
    }
    assert_eq!(session.rules().len(), 4);
    assert_eq!(session.rules()[1].value, "USD");
    assert!(session.rules().iter().all(|r| r.is_valid));
    assert_eq!(repo.list_rules().unwrap().len(), 4);
    assert!(repo.get_schema("invoice").unwrap().is_some());

    assert!(session.validate(&invoice).unwrap().is_valid());

    let mut euro = invoice.clone();
    euro["billingCurrency"] = json!("EUR");
    let report = session.validate(&euro).unwrap();
    assert_eq!(report.rule_issues().count(), 1, "{report}");
    assert_eq!(report.schema_issues().count(), 1, "{report}");
}

#[test]
fn missing_exempt_field_never_reports_required() {
    let invoice = sample_invoice();
    let session = RuleSession::from_sample(&invoice, EngineConfig::default());

    let mut without_po = invoice.clone();
    without_po
        .as_object_mut()
        .unwrap()
        .remove("purchaseOrderNumber");
    assert!(session.validate(&without_po).unwrap().is_valid());

    let mut without_terms = invoice;
    without_terms.as_object_mut().unwrap().remove("terms");
    let report = session.validate(&without_terms).unwrap();
    assert_eq!(report.len(), 1, "{report}");
}
