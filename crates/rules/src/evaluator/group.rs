//! Group evaluation and the shared combinator semantics.

use tracing::{debug, warn};
use verdict_core::Subject;

use crate::expression::{letter_values, Expr};
use crate::schema::{Combinator, Group};
use crate::scoring::pass_rate;

use super::rule::evaluate_rule;
use super::{GroupResult, RuleResult};

/// Evaluate every active rule of `group` and reduce them with its combinator.
///
/// Inactive rules are omitted from the result entirely. Skipped rules are
/// listed but excluded from `passed_count`, `effective_count` and the score.
pub fn evaluate_group(group: &Group, subject: &Subject) -> GroupResult {
    let rule_results: Vec<RuleResult> = group
        .rules
        .iter()
        .filter(|rule| rule.active)
        .map(|rule| evaluate_rule(rule, subject))
        .collect();

    let outcomes: Vec<bool> = rule_results
        .iter()
        .filter(|r| r.is_effective())
        .map(|r| r.passed)
        .collect();
    let passed_count = outcomes.iter().filter(|p| **p).count();

    let (passed, error) = match combine(
        group.combination,
        &outcomes,
        group.min_required,
        group.boolean_expression.as_deref(),
    ) {
        Ok(passed) => (passed, None),
        Err(e) => {
            warn!(group_id = %group.id, error = %e, "group combination failed closed");
            (false, Some(e))
        }
    };

    debug!(
        group_id = %group.id,
        combination = %group.combination,
        passed,
        passed_count,
        effective = outcomes.len(),
        "group evaluated"
    );

    GroupResult {
        group_id: group.id.clone(),
        name: group.name.clone(),
        combination: group.combination,
        passed,
        score: pass_rate(passed_count, outcomes.len()),
        passed_count,
        effective_count: outcomes.len(),
        rule_results,
        error,
    }
}

/// Reduce effective pass/fail outcomes to one boolean.
///
/// Used for rules within a group and for groups within a criteria. For
/// `Boolean`, outcome `i` is bound to the `i`-th letter (`a`, `b`, …).
/// Configuration problems are returned as a diagnostic message.
pub fn combine(
    combinator: Combinator,
    outcomes: &[bool],
    min_required: Option<u32>,
    expression: Option<&str>,
) -> Result<bool, String> {
    let passed = outcomes.iter().filter(|p| **p).count();
    let total = outcomes.len();

    match combinator {
        Combinator::All => Ok(passed == total),
        Combinator::Any => Ok(passed > 0),
        Combinator::Min => match min_required {
            Some(min) if min >= 1 => Ok(passed >= min as usize),
            Some(min) => Err(format!("MIN combination requires min_required >= 1, got {min}")),
            None => Err("MIN combination requires min_required".to_string()),
        },
        Combinator::Majority => Ok(passed * 2 > total),
        Combinator::Boolean => {
            let source = expression
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| "BOOLEAN combination requires a boolean_expression".to_string())?;
            Expr::parse(source)
                .and_then(|expr| expr.eval(&letter_values(outcomes.iter().copied())))
                .map_err(|e| format!("boolean expression '{source}': {e}"))
        }
    }
}
