//! Group and combination validation, explicit and clustered.

use std::collections::HashSet;

use super::ValidationResult;
use crate::evaluator::effective_groups;
use crate::expression::{letter_for, Expr};
use crate::schema::{Combinator, Criteria};

pub(super) fn validate_groups(criteria: &Criteria, result: &mut ValidationResult) {
    let spec = &criteria.spec;
    let explicit = !spec.groups.is_empty();

    if explicit && !spec.rules.is_empty() {
        result.warn(
            "spec.rules",
            format!(
                "{} ungrouped rule(s) are ignored because spec.groups is present",
                spec.rules.len()
            ),
        );
    }

    let groups = effective_groups(criteria);
    let mut seen = HashSet::new();

    for (i, group) in groups.iter().enumerate() {
        let path = if explicit {
            format!("spec.groups[{i}]")
        } else {
            format!("spec.rules ({})", group.id)
        };

        if group.id.trim().is_empty() {
            result.error(format!("{path}.id"), "group id is empty");
        } else if !seen.insert(group.id.as_str()) {
            result.error(format!("{path}.id"), format!("duplicate group id '{}'", group.id));
        }

        if !group.weight.is_finite() || group.weight < 0.0 {
            result.error(
                format!("{path}.weight"),
                format!("weight must be a non-negative number, got {}", group.weight),
            );
        }

        let active = group.rules.iter().filter(|r| r.active).count();
        if !group.rules.is_empty() && active == 0 {
            result.warn(path.as_str(), "every rule in the group is inactive");
        }

        check_combination(
            group.combination,
            group.min_required,
            group.boolean_expression.as_deref(),
            active,
            &path,
            result,
        );
    }

    check_combination(
        spec.combination,
        spec.min_required,
        spec.boolean_expression.as_deref(),
        groups.len(),
        "spec",
        result,
    );
}

/// Check combinator parameters against the number of combined outcomes.
fn check_combination(
    combinator: Combinator,
    min_required: Option<u32>,
    expression: Option<&str>,
    outcome_count: usize,
    path: &str,
    result: &mut ValidationResult,
) {
    match (combinator, min_required) {
        (Combinator::Min, None) => {
            result.error(format!("{path}.min_required"), "MIN combination requires min_required");
        }
        (Combinator::Min, Some(0)) => {
            result.error(format!("{path}.min_required"), "min_required must be at least 1");
        }
        (Combinator::Min, Some(n)) if n as usize > outcome_count => {
            result.warn(
                format!("{path}.min_required"),
                format!("min_required {n} exceeds the {outcome_count} combined outcome(s); never satisfiable"),
            );
        }
        (Combinator::Min, Some(_)) => {}
        (other, Some(_)) => {
            result.warn(
                format!("{path}.min_required"),
                format!("min_required is ignored by {other} combination"),
            );
        }
        (_, None) => {}
    }

    let expression = expression.map(str::trim).filter(|s| !s.is_empty());
    match (combinator, expression) {
        (Combinator::Boolean, None) => {
            result.error(
                format!("{path}.boolean_expression"),
                "BOOLEAN combination requires a boolean_expression",
            );
        }
        (Combinator::Boolean, Some(source)) => match Expr::parse(source) {
            Ok(expr) => {
                let addressable = outcome_count.min(26);
                let out_of_range: String = expr
                    .identifiers()
                    .into_iter()
                    .filter(|c| !(0..addressable).any(|i| letter_for(i) == Some(*c)))
                    .collect();
                if !out_of_range.is_empty() {
                    result.error(
                        format!("{path}.boolean_expression"),
                        format!(
                            "identifier(s) '{out_of_range}' exceed the {addressable} addressable outcome(s)"
                        ),
                    );
                }
            }
            Err(e) => {
                result.error(
                    format!("{path}.boolean_expression"),
                    format!("invalid boolean expression: {e}"),
                );
            }
        },
        (other, Some(_)) => {
            result.warn(
                format!("{path}.boolean_expression"),
                format!("boolean_expression is ignored by {other} combination"),
            );
        }
        (_, None) => {}
    }
}
