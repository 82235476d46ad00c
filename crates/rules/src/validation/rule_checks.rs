//! Rule-level validation: ids, fields, operators, expected values, weights, dependencies.

use std::collections::HashSet;

use super::{suggest_operator, ValidationResult};
use crate::comparator::check_expected;
use crate::schema::{Condition, Criteria, Operator, Rule};

pub(super) fn validate_rules(criteria: &Criteria, result: &mut ValidationResult) {
    let spec = &criteria.spec;
    let mut seen = HashSet::new();

    for (gi, group) in spec.groups.iter().enumerate() {
        for (ri, rule) in group.rules.iter().enumerate() {
            let path = format!("spec.groups[{gi}].rules[{ri}]");
            if rule.group_logic.is_some() {
                result.warn(
                    format!("{path}.group_logic"),
                    "group_logic is ignored inside an explicit group",
                );
            }
            validate_rule(rule, &path, &mut seen, result);
        }
    }

    for (ri, rule) in spec.rules.iter().enumerate() {
        validate_rule(rule, &format!("spec.rules[{ri}]"), &mut seen, result);
    }
}

fn validate_rule<'a>(
    rule: &'a Rule,
    path: &str,
    seen: &mut HashSet<&'a str>,
    result: &mut ValidationResult,
) {
    if rule.id.trim().is_empty() {
        result.error(format!("{path}.id"), "rule id is empty");
    } else if !seen.insert(rule.id.as_str()) {
        result.error(format!("{path}.id"), format!("duplicate rule id '{}'", rule.id));
    }

    if rule.field.trim().is_empty() {
        result.error(format!("{path}.field"), "field path is empty");
    }

    if !rule.weight.is_finite() || rule.weight < 0.0 {
        result.error(
            format!("{path}.weight"),
            format!("weight must be a non-negative number, got {}", rule.weight),
        );
    }

    check_operator(&rule.operator, &rule.expected, path, result);

    for (di, condition) in rule.dependencies.iter().enumerate() {
        validate_condition(condition, &format!("{path}.dependencies[{di}]"), result);
    }
}

fn validate_condition(condition: &Condition, path: &str, result: &mut ValidationResult) {
    if condition.field.trim().is_empty() {
        result.error(format!("{path}.field"), "field path is empty");
    }
    check_operator(&condition.operator, &condition.expected, path, result);
}

fn check_operator(
    operator: &Operator,
    expected: &verdict_core::Value,
    path: &str,
    result: &mut ValidationResult,
) {
    if let Operator::Unknown(name) = operator {
        let message = format!("unknown operator '{name}'");
        match suggest_operator(name) {
            Some(suggestion) => {
                result.error_with_suggestion(format!("{path}.operator"), message, suggestion)
            }
            None => result.error(format!("{path}.operator"), message),
        }
        return;
    }

    if let Err(e) = check_expected(operator, expected) {
        result.error(format!("{path}.expected"), e);
    }
}
