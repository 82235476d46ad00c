use super::*;
use crate::schema::*;
use verdict_core::Value;

fn criteria(spec: CriteriaSpec) -> Criteria {
    Criteria::new(CommonMetadata::new("test", "Test"), spec)
}

fn loan_spec() -> CriteriaSpec {
    CriteriaSpec {
        threshold: 70.0,
        scoring_method: ScoringMethod::Weighted,
        groups: vec![Group::new(
            "financial",
            Combinator::All,
            vec![
                Rule::new("income", "income", ">=", 3000).with_weight(40.0),
                Rule::new("credit", "credit_score", ">=", 650).with_weight(60.0),
            ],
        )],
        ..CriteriaSpec::default()
    }
}

// ── Scoring scenarios ───────────────────────────────────────────────

#[test]
fn failed_rules_keep_group_then_rule_order() {
    let spec = CriteriaSpec {
        groups: vec![
            Group::new(
                "identity",
                Combinator::Any,
                vec![
                    Rule::new("passport", "passport", "exists", Value::Null),
                    Rule::new("national-id", "national_id", "exists", Value::Null),
                ],
            ),
            Group::new(
                "financial",
                Combinator::All,
                vec![
                    Rule::new("income", "income", ">=", 3000),
                    Rule::new("credit", "credit_score", ">=", 650),
                ],
            ),
        ],
        ..CriteriaSpec::default()
    };
    let subject = Subject::new()
        .with("national_id", "X-1")
        .with("income", 1000)
        .with("credit_score", 400);
    let result = CriteriaEvaluator::new().evaluate(&criteria(spec), &subject);

    assert_eq!(result.failed_rule_ids(), vec!["passport", "income", "credit"]);
    assert!(result.group_results[0].passed);
    assert!(!result.group_results[1].passed);
    assert!(!result.groups_passed);
    assert_eq!(result.score, 25.0);
}

#[test]
fn weighted_labels_follow_builtin_bands() {
    let criteria = criteria(loan_spec());
    let evaluator = CriteriaEvaluator::new();

    let full = Subject::new().with("income", 5000).with("credit_score", 750);
    assert_eq!(evaluator.evaluate(&criteria, &full).decision, "Excellent");

    let credit_only = Subject::new().with("income", 100).with("credit_score", 750);
    let result = evaluator.evaluate(&criteria, &credit_only);
    assert_eq!(result.score, 60.0);
    assert_eq!(result.decision, "Needs Improvement");

    let neither = Subject::new();
    assert_eq!(evaluator.evaluate(&criteria, &neither).decision, "Rejected");
}

#[test]
fn sum_scoring_exceeds_hundred() {
    let spec = CriteriaSpec {
        scoring_method: ScoringMethod::Sum,
        threshold: 120.0,
        rules: vec![
            Rule::new("a", "a", "eq", 1).with_weight(80.0),
            Rule::new("b", "b", "eq", 1).with_weight(70.0),
        ],
        ..CriteriaSpec::default()
    };
    let subject = Subject::new().with("a", 1).with("b", 1);
    let result = CriteriaEvaluator::new().evaluate(&criteria(spec), &subject);
    assert_eq!(result.score, 150.0);
    assert!(result.passed);
}

// ── Skips, grouping and combination ─────────────────────────────────

#[test]
fn skipped_rules_do_not_count() {
    let mut spec = loan_spec();
    spec.groups[0].rules[1] = Rule::new("credit", "credit_score", ">=", 650)
        .with_weight(60.0)
        .depends_on(Condition::new("has_history", "eq", true));

    let subject = Subject::new()
        .with("income", 5000)
        .with("credit_score", 100)
        .with("has_history", false);
    let result = CriteriaEvaluator::new().evaluate(&criteria(spec), &subject);

    let group = &result.group_results[0];
    assert_eq!(group.rule_results.len(), 2);
    assert!(group.rule_results[1].skipped);
    assert_eq!(group.effective_count, 1);
    assert_eq!(group.passed_count, 1);
    assert!(group.passed);
    assert_eq!(result.score, 100.0, "skipped weight excluded from the denominator");
    assert!(result.failed_rules.is_empty(), "skipped rules are not failures");
}

#[test]
fn group_and_score_disagreement_is_reported() {
    // Groups pass under ANY, but weighted score stays below threshold.
    let spec = CriteriaSpec {
        threshold: 70.0,
        groups: vec![Group::new(
            "g",
            Combinator::Any,
            vec![
                Rule::new("small", "a", "eq", true).with_weight(10.0),
                Rule::new("big", "b", "eq", true).with_weight(90.0),
            ],
        )],
        ..CriteriaSpec::default()
    };
    let subject = Subject::new().with("a", true).with("b", false);
    let result = CriteriaEvaluator::new().evaluate(&criteria(spec), &subject);
    assert!(result.groups_passed);
    assert!(!result.passed);
    assert!(result.disagrees());
}

#[test]
fn top_level_boolean_over_groups() {
    let spec = CriteriaSpec {
        combination: Combinator::Boolean,
        boolean_expression: Some("(a OR b) AND NOT c".into()),
        groups: vec![
            Group::new("first", Combinator::All, vec![Rule::new("x", "x", "eq", 1)]),
            Group::new("second", Combinator::All, vec![Rule::new("y", "y", "eq", 1)]),
            Group::new("third", Combinator::All, vec![Rule::new("z", "z", "eq", 1)]),
        ],
        ..CriteriaSpec::default()
    };
    let criteria = criteria(spec);
    let evaluator = CriteriaEvaluator::new();

    let subject = Subject::new().with("x", 0).with("y", 1).with("z", 0);
    assert!(evaluator.evaluate(&criteria, &subject).groups_passed);

    let subject = Subject::new().with("x", 1).with("y", 1).with("z", 1);
    assert!(!evaluator.evaluate(&criteria, &subject).groups_passed);
}

#[test]
fn top_level_misconfiguration_is_diagnosed() {
    let mut spec = loan_spec();
    spec.combination = Combinator::Min;
    let subject = Subject::new().with("income", 5000).with("credit_score", 750);
    let result = CriteriaEvaluator::new().evaluate(&criteria(spec), &subject);

    assert!(!result.groups_passed);
    assert!(result.passed, "score-derived pass is unaffected");
    assert_eq!(result.diagnostics.len(), 1);
    assert!(result.diagnostics[0].contains("min_required"));
}

#[test]
fn legacy_rules_cluster_by_tag() {
    let spec = CriteriaSpec {
        scoring_method: ScoringMethod::Average,
        rules: vec![
            Rule::new("age", "age", "gte", 18),
            Rule::new("ph", "country", "eq", "PH").tagged(Combinator::Any),
            Rule::new("sg", "country", "eq", "SG").tagged(Combinator::Any),
        ],
        ..CriteriaSpec::default()
    };
    let subject = Subject::new().with("age", 30).with("country", "SG");
    let result = CriteriaEvaluator::new().evaluate(&criteria(spec), &subject);

    assert_eq!(result.group_results.len(), 2);
    assert_eq!(result.group_results[1].combination, Combinator::Any);
    assert!(result.groups_passed);
    assert!((result.score - 200.0 / 3.0).abs() < 1e-9);
}

#[test]
fn explicit_groups_shadow_flat_rules() {
    let mut spec = loan_spec();
    spec.rules.push(Rule::new("ignored", "nothing", "exists", Value::Null));
    let subject = Subject::new().with("income", 5000).with("credit_score", 750);
    let result = CriteriaEvaluator::new().evaluate(&criteria(spec), &subject);
    assert_eq!(result.rule_results().count(), 2);
    assert!(result.passed);
}

// ── Degenerate inputs ───────────────────────────────────────────────

#[test]
fn empty_criteria_is_a_defined_failure() {
    let evaluator = CriteriaEvaluator::with_default_decision("Declined");
    let result = evaluator.evaluate(&criteria(CriteriaSpec::default()), &Subject::new());
    assert!(!result.passed);
    assert!(!result.groups_passed);
    assert_eq!(result.score, 0.0);
    assert_eq!(result.decision, "Declined");
    assert!(result.group_results.is_empty());
}

#[test]
fn invalid_decision_table_falls_back() {
    let mut spec = loan_spec();
    spec.decisions = Some(vec![
        DecisionBand { min_score: 50.0, label: "A".into() },
        DecisionBand { min_score: 50.0, label: "B".into() },
    ]);
    let subject = Subject::new().with("income", 5000).with("credit_score", 750);
    let result = CriteriaEvaluator::new().evaluate(&criteria(spec), &subject);
    assert_eq!(result.decision, "Excellent");
    assert!(result.diagnostics[0].starts_with("decisions:"));
}

#[test]
fn custom_decisions_and_default() {
    let mut spec = loan_spec();
    spec.decisions = Some(vec![DecisionBand { min_score: 100.0, label: "Approved".into() }]);
    spec.default_decision = Some("Referred".into());
    let criteria = criteria(spec);
    let evaluator = CriteriaEvaluator::new();

    let full = Subject::new().with("income", 5000).with("credit_score", 750);
    assert_eq!(evaluator.evaluate(&criteria, &full).decision, "Approved");

    let partial = Subject::new().with("income", 5000);
    assert_eq!(evaluator.evaluate(&criteria, &partial).decision, "Referred");
}

#[test]
fn evaluation_is_deterministic() {
    let criteria = criteria(loan_spec());
    let subject = Subject::new().with("income", 2500).with("credit_score", 700);
    let evaluator = CriteriaEvaluator::new();

    let first = serde_json::to_string(&evaluator.evaluate(&criteria, &subject)).unwrap();
    for _ in 0..5 {
        let again = serde_json::to_string(&evaluator.evaluate(&criteria, &subject)).unwrap();
        assert_eq!(first, again);
    }
}
