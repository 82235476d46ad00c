//! Single-rule evaluation behind the dependency gate.

use tracing::{trace, warn};
use verdict_core::{Subject, Value};

use crate::comparator::{check_expected, compare};
use crate::schema::{Condition, Rule};

use super::RuleResult;

/// Evaluate one rule against `subject`.
///
/// A rule whose dependencies do not all hold is returned as skipped. A rule
/// whose expected value does not fit its operator is returned as failed with
/// the diagnostic in `error`.
pub fn evaluate_rule(rule: &Rule, subject: &Subject) -> RuleResult {
    let actual = subject.lookup(&rule.field);
    let weight = effective_weight(rule);

    let mut result = RuleResult {
        rule_id: rule.id.clone(),
        field: rule.field.clone(),
        operator: rule.operator.clone(),
        expected: rule.expected.clone(),
        actual: actual.cloned().unwrap_or(Value::Null),
        passed: false,
        skipped: false,
        weight,
        score_contribution: 0.0,
        error: None,
    };

    if !dependencies_satisfied(rule, subject) {
        trace!(rule_id = %rule.id, "dependency not met, rule skipped");
        result.skipped = true;
        return result;
    }

    if let Err(e) = check_expected(&rule.operator, &rule.expected) {
        warn!(rule_id = %rule.id, error = %e, "rule misconfigured, failing closed");
        result.error = Some(e);
        return result;
    }

    result.passed = compare(actual, &rule.operator, &rule.expected);
    if result.passed {
        result.score_contribution = weight;
    } else if actual.is_none() {
        trace!(rule_id = %rule.id, field = %rule.field, "field absent");
    }
    result
}

/// All dependency conditions hold. Rules without dependencies always pass.
pub fn dependencies_satisfied(rule: &Rule, subject: &Subject) -> bool {
    rule.dependencies
        .iter()
        .all(|condition| condition_holds(condition, subject))
}

/// Evaluate one dependency condition. Misconfigured conditions never hold.
pub fn condition_holds(condition: &Condition, subject: &Subject) -> bool {
    if let Err(e) = check_expected(&condition.operator, &condition.expected) {
        warn!(field = %condition.field, error = %e, "dependency misconfigured, treated as unmet");
        return false;
    }
    compare(
        subject.lookup(&condition.field),
        &condition.operator,
        &condition.expected,
    )
}

/// Negative or non-finite weights count as zero.
fn effective_weight(rule: &Rule) -> f64 {
    if rule.weight.is_finite() && rule.weight >= 0.0 {
        rule.weight
    } else {
        trace!(rule_id = %rule.id, weight = rule.weight, "invalid weight treated as 0");
        0.0
    }
}
