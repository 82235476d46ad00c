//! Property tests for scoring and evaluation invariants.

use proptest::prelude::*;

use verdict_core::Subject;
use verdict_rules::schema::{
    Combinator, CommonMetadata, Condition, CriteriaSpec, Group, Rule, ScoringMethod,
};
use verdict_rules::{Criteria, CriteriaEvaluator};

fn scoring_method() -> impl Strategy<Value = ScoringMethod> {
    prop_oneof![
        Just(ScoringMethod::Weighted),
        Just(ScoringMethod::PassFail),
        Just(ScoringMethod::Sum),
        Just(ScoringMethod::Average),
    ]
}

fn combinator() -> impl Strategy<Value = Combinator> {
    prop_oneof![
        Just(Combinator::All),
        Just(Combinator::Any),
        Just(Combinator::Majority),
    ]
}

/// Rule `i` checks `f{i} >= threshold_i`, optionally gated on `gate{i} == true`.
fn build(
    method: ScoringMethod,
    combination: Combinator,
    rules: &[(i64, f64, bool)],
) -> Criteria {
    let rules = rules
        .iter()
        .enumerate()
        .map(|(i, (threshold, weight, gated))| {
            let rule = Rule::new(format!("r{i}"), format!("f{i}"), "gte", *threshold).with_weight(*weight);
            if *gated {
                rule.depends_on(Condition::new(format!("gate{i}"), "eq", true))
            } else {
                rule
            }
        })
        .collect();
    let spec = CriteriaSpec {
        scoring_method: method,
        groups: vec![Group::new("g", combination, rules)],
        ..CriteriaSpec::default()
    };
    Criteria::new(CommonMetadata::new("prop", "Property"), spec)
}

fn subject(values: &[i64], gates: &[bool]) -> Subject {
    let mut subject = Subject::new();
    for (i, v) in values.iter().enumerate() {
        subject.insert(format!("f{i}"), *v);
    }
    for (i, g) in gates.iter().enumerate() {
        subject.insert(format!("gate{i}"), *g);
    }
    subject
}

fn rules_and_subject() -> impl Strategy<Value = (Vec<(i64, f64, bool)>, Vec<i64>, Vec<bool>)> {
    (1usize..8).prop_flat_map(|n| {
        (
            prop::collection::vec((0i64..100, 0.0f64..50.0, any::<bool>()), n),
            prop::collection::vec(0i64..100, n),
            prop::collection::vec(any::<bool>(), n),
        )
    })
}

proptest! {
    #[test]
    fn bounded_methods_stay_within_0_and_100(
        method in scoring_method(),
        combination in combinator(),
        (rules, values, gates) in rules_and_subject(),
    ) {
        let result = CriteriaEvaluator::new().evaluate(&build(method, combination, &rules), &subject(&values, &gates));
        if method != ScoringMethod::Sum {
            prop_assert!((0.0..=100.0).contains(&result.score), "score {}", result.score);
        }
    }

    #[test]
    fn sum_equals_passed_weights(
        (rules, values, gates) in rules_and_subject(),
    ) {
        let result = CriteriaEvaluator::new()
            .evaluate(&build(ScoringMethod::Sum, Combinator::All, &rules), &subject(&values, &gates));
        let expected: f64 = result
            .rule_results()
            .filter(|r| r.passed)
            .map(|r| r.weight)
            .sum();
        prop_assert!((result.score - expected).abs() < 1e-9);
    }

    #[test]
    fn skipped_rules_never_count(
        (rules, values, gates) in rules_and_subject(),
    ) {
        let result = CriteriaEvaluator::new()
            .evaluate(&build(ScoringMethod::Average, Combinator::All, &rules), &subject(&values, &gates));
        let group = &result.group_results[0];

        let skipped = group.rule_results.iter().filter(|r| r.skipped).count();
        prop_assert_eq!(group.effective_count, group.rule_results.len() - skipped);
        for r in group.rule_results.iter().filter(|r| r.skipped) {
            prop_assert!(!r.passed);
            prop_assert_eq!(r.score_contribution, 0.0);
        }
        prop_assert!(result.failed_rules.iter().all(|r| !r.skipped));

        // Removing the skipped rules leaves the outcome unchanged.
        let kept: Vec<(i64, f64, bool)> = rules
            .iter()
            .zip(&gates)
            .filter(|((_, _, gated), gate)| !*gated || **gate)
            .map(|((t, w, _), _)| (*t, *w, false))
            .collect();
        let kept_values: Vec<i64> = values
            .iter()
            .zip(rules.iter().zip(&gates))
            .filter(|(_, ((_, _, gated), gate))| !*gated || **gate)
            .map(|(v, _)| *v)
            .collect();
        let reduced = CriteriaEvaluator::new()
            .evaluate(&build(ScoringMethod::Average, Combinator::All, &kept), &subject(&kept_values, &[]));
        prop_assert_eq!(result.score, reduced.score);
        prop_assert_eq!(result.group_results[0].passed, reduced.group_results[0].passed);
    }

    #[test]
    fn raising_a_gte_threshold_never_turns_fail_into_pass(
        actual in 0i64..100,
        low in 0i64..100,
        bump in 0i64..50,
    ) {
        let evaluator = CriteriaEvaluator::new();
        let subject = subject(&[actual], &[]);
        let before = evaluator.evaluate(&build(ScoringMethod::Weighted, Combinator::All, &[(low, 1.0, false)]), &subject);
        let after = evaluator.evaluate(&build(ScoringMethod::Weighted, Combinator::All, &[(low + bump, 1.0, false)]), &subject);
        prop_assert!(!after.failed_rules.is_empty() || before.failed_rules.is_empty());
        prop_assert!(after.score <= before.score);
    }

    #[test]
    fn evaluation_is_deterministic(
        method in scoring_method(),
        combination in combinator(),
        (rules, values, gates) in rules_and_subject(),
    ) {
        let criteria = build(method, combination, &rules);
        let subject = subject(&values, &gates);
        let evaluator = CriteriaEvaluator::new();
        let first = serde_json::to_string(&evaluator.evaluate(&criteria, &subject)).unwrap();
        let second = serde_json::to_string(&evaluator.evaluate(&criteria, &subject)).unwrap();
        prop_assert_eq!(first, second);
    }
}
