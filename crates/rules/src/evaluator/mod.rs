//! Criteria evaluation: rules → groups → score → decision.
//!
//! The pipeline is pure and synchronous. For each group (explicit, or
//! clustered from flat rules), every active rule passes the dependency gate
//! and is compared against the subject; the group combinator reduces the
//! effective outcomes. Group outcomes are combined once more at the criteria
//! level, while the score is computed independently over all non-skipped rule
//! results and compared against the threshold.
//!
//! Configuration problems never abort an evaluation. They fail the affected
//! rule or group closed and are reported through `error` fields and
//! [`EvaluationResult::diagnostics`].

mod group;
mod result;
mod rule;

use std::borrow::Cow;

use tracing::{debug, warn};
use verdict_core::Subject;

use crate::cluster::cluster;
use crate::decision::{ThresholdTable, DEFAULT_DECISION};
use crate::schema::{Criteria, Group};
use crate::scoring::{compute_score, passes};

pub use group::{combine, evaluate_group};
pub use result::{EvaluationResult, GroupResult, RuleResult};
pub use rule::{condition_holds, dependencies_satisfied, evaluate_rule};

// ── Criteria evaluator ──────────────────────────────────────────────

/// Evaluates criteria against subjects.
///
/// Holds only the fallback decision label; safe to share across threads.
#[derive(Debug, Clone)]
pub struct CriteriaEvaluator {
    default_decision: String,
}

impl CriteriaEvaluator {
    pub fn new() -> Self {
        Self::with_default_decision(DEFAULT_DECISION)
    }

    /// Label used when a criteria declares no `default_decision` of its own.
    pub fn with_default_decision(label: impl Into<String>) -> Self {
        Self {
            default_decision: label.into(),
        }
    }

    pub fn default_decision(&self) -> &str {
        &self.default_decision
    }

    /// Evaluate `criteria` against `subject`.
    pub fn evaluate(&self, criteria: &Criteria, subject: &Subject) -> EvaluationResult {
        let spec = &criteria.spec;
        let mut diagnostics = Vec::new();

        let table = ThresholdTable::for_criteria(spec, &self.default_decision).unwrap_or_else(|e| {
            warn!(criteria_id = %criteria.id(), error = %e, "invalid decision table, using built-in bands");
            diagnostics.push(format!("decisions: {e}"));
            ThresholdTable::builtin(
                spec.default_decision
                    .clone()
                    .unwrap_or_else(|| self.default_decision.clone()),
            )
        });

        if criteria.is_empty() {
            debug!(criteria_id = %criteria.id(), "criteria has no rules");
            return EvaluationResult {
                criteria_id: criteria.id().to_string(),
                passed: false,
                score: 0.0,
                decision: table.default_label().to_string(),
                scoring_method: spec.scoring_method,
                threshold: spec.threshold,
                groups_passed: false,
                failed_rules: Vec::new(),
                group_results: Vec::new(),
                diagnostics,
            };
        }

        let group_results: Vec<GroupResult> = effective_groups(criteria)
            .iter()
            .map(|group| evaluate_group(group, subject))
            .collect();

        let outcomes: Vec<bool> = group_results.iter().map(|g| g.passed).collect();
        let groups_passed = match combine(
            spec.combination,
            &outcomes,
            spec.min_required,
            spec.boolean_expression.as_deref(),
        ) {
            Ok(passed) => passed,
            Err(e) => {
                warn!(criteria_id = %criteria.id(), error = %e, "criteria combination failed closed");
                diagnostics.push(format!("combination: {e}"));
                false
            }
        };

        let all_rules = group_results.iter().flat_map(|g| g.rule_results.iter());
        let score = compute_score(spec.scoring_method, all_rules.clone());
        let passed = passes(spec.scoring_method, score, spec.threshold);
        let failed_rules: Vec<RuleResult> = all_rules.filter(|r| r.is_failure()).cloned().collect();

        debug!(
            criteria_id = %criteria.id(),
            passed,
            score,
            groups_passed,
            failed = failed_rules.len(),
            "criteria evaluated"
        );

        EvaluationResult {
            criteria_id: criteria.id().to_string(),
            passed,
            score,
            decision: table.label(score).to_string(),
            scoring_method: spec.scoring_method,
            threshold: spec.threshold,
            groups_passed,
            failed_rules,
            group_results,
            diagnostics,
        }
    }
}

impl Default for CriteriaEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// Explicit groups when declared, otherwise flat rules clustered by tag.
pub fn effective_groups(criteria: &Criteria) -> Cow<'_, [Group]> {
    if criteria.spec.groups.is_empty() {
        Cow::Owned(cluster(&criteria.spec.rules))
    } else {
        Cow::Borrowed(&criteria.spec.groups)
    }
}

#[cfg(test)]
mod tests;
