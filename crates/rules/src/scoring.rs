//! Criteria-level score algebras.
//!
//! Each method reduces the non-skipped rule results of a whole evaluation to
//! one number. Skipped results are filtered here, so callers can pass the
//! full flattened result set.

use crate::evaluator::RuleResult;
use crate::schema::ScoringMethod;

/// Compute the criteria score for `results` under `method`.
///
/// | method      | score                                              |
/// |-------------|----------------------------------------------------|
/// | `weighted`  | passed weight / total weight × 100 (0 when no weight) |
/// | `pass_fail` | 100 when every rule passed, else 0 (0 when no rules) |
/// | `sum`       | sum of passed weights, unbounded                    |
/// | `average`   | passed count / rule count × 100                     |
pub fn compute_score<'a>(
    method: ScoringMethod,
    results: impl IntoIterator<Item = &'a RuleResult>,
) -> f64 {
    let effective: Vec<&RuleResult> = results.into_iter().filter(|r| r.is_effective()).collect();

    match method {
        ScoringMethod::Weighted => {
            let total: f64 = effective.iter().map(|r| r.weight).sum();
            if total <= 0.0 {
                return 0.0;
            }
            let passed: f64 = effective.iter().map(|r| r.score_contribution).sum();
            (passed / total * 100.0).clamp(0.0, 100.0)
        }
        ScoringMethod::PassFail => {
            if !effective.is_empty() && effective.iter().all(|r| r.passed) {
                100.0
            } else {
                0.0
            }
        }
        ScoringMethod::Sum => effective.iter().map(|r| r.score_contribution).sum(),
        ScoringMethod::Average => pass_rate(
            effective.iter().filter(|r| r.passed).count(),
            effective.len(),
        ),
    }
}

/// Whether `score` clears the criteria under `method`.
///
/// Pass/fail ignores the threshold and requires a perfect score.
pub fn passes(method: ScoringMethod, score: f64, threshold: f64) -> bool {
    match method {
        ScoringMethod::PassFail => score >= 100.0,
        _ => score >= threshold,
    }
}

/// `passed / total × 100`, or 0 with nothing to count.
pub(crate) fn pass_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Operator;
    use verdict_core::Value;

    const NONE: [RuleResult; 0] = [];

    fn result(passed: bool, skipped: bool, weight: f64) -> RuleResult {
        RuleResult {
            rule_id: "r".into(),
            field: "f".into(),
            operator: Operator::Eq,
            expected: Value::Null,
            actual: Value::Null,
            passed,
            skipped,
            weight,
            score_contribution: if passed { weight } else { 0.0 },
            error: None,
        }
    }

    #[test]
    fn weighted_uses_weights() {
        let results = [result(false, false, 40.0), result(true, false, 60.0)];
        assert_eq!(compute_score(ScoringMethod::Weighted, &results), 60.0);
    }

    #[test]
    fn weighted_zero_denominator() {
        let results = [result(false, false, 0.0)];
        assert_eq!(compute_score(ScoringMethod::Weighted, &results), 0.0);
        assert_eq!(compute_score(ScoringMethod::Weighted, &NONE), 0.0);
    }

    #[test]
    fn pass_fail_is_binary() {
        let all = [result(true, false, 1.0), result(true, false, 5.0)];
        let one_failed = [result(true, false, 1.0), result(false, false, 5.0)];
        assert_eq!(compute_score(ScoringMethod::PassFail, &all), 100.0);
        assert_eq!(compute_score(ScoringMethod::PassFail, &one_failed), 0.0);
        assert_eq!(compute_score(ScoringMethod::PassFail, &NONE), 0.0);
    }

    #[test]
    fn sum_is_unbounded() {
        let results = [result(true, false, 80.0), result(true, false, 70.0), result(false, false, 5.0)];
        assert_eq!(compute_score(ScoringMethod::Sum, &results), 150.0);
    }

    #[test]
    fn average_ignores_weights() {
        let results = [result(true, false, 100.0), result(false, false, 1.0)];
        assert_eq!(compute_score(ScoringMethod::Average, &results), 50.0);
    }

    #[test]
    fn skipped_results_are_excluded_everywhere() {
        let results = [result(true, false, 10.0), result(false, true, 90.0)];
        assert_eq!(compute_score(ScoringMethod::Weighted, &results), 100.0);
        assert_eq!(compute_score(ScoringMethod::PassFail, &results), 100.0);
        assert_eq!(compute_score(ScoringMethod::Sum, &results), 10.0);
        assert_eq!(compute_score(ScoringMethod::Average, &results), 100.0);
    }

    #[test]
    fn pass_decision() {
        assert!(passes(ScoringMethod::Weighted, 70.0, 70.0));
        assert!(!passes(ScoringMethod::Weighted, 69.99, 70.0));
        assert!(passes(ScoringMethod::Sum, 150.0, 100.0));
        assert!(!passes(ScoringMethod::PassFail, 0.0, 0.0));
        assert!(passes(ScoringMethod::PassFail, 100.0, 500.0));
    }
}
