//! Evaluation output records.
//!
//! These are the externally consumed shapes. They carry no timestamps, so
//! evaluating the same criteria against the same subject serializes to the
//! same bytes every time.

use serde::{Deserialize, Serialize};
use verdict_core::Value;

use crate::schema::{Combinator, Operator, ScoringMethod};

/// Outcome of one rule against one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleResult {
    pub rule_id: String,
    pub field: String,
    pub operator: Operator,
    pub expected: Value,
    /// Looked-up subject value; `null` when the field is absent.
    pub actual: Value,
    pub passed: bool,
    /// Dependency gate failed; excluded from every count and score.
    pub skipped: bool,
    pub weight: f64,
    pub score_contribution: f64,
    /// Configuration problem that forced the rule closed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RuleResult {
    /// True for rules that count toward combinators and scoring.
    pub fn is_effective(&self) -> bool {
        !self.skipped
    }

    /// Failed and not skipped.
    pub fn is_failure(&self) -> bool {
        !self.passed && !self.skipped
    }
}

/// Outcome of one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupResult {
    pub group_id: String,
    pub name: String,
    pub combination: Combinator,
    pub passed: bool,
    /// Pass rate over non-skipped rules, 0–100.
    pub score: f64,
    pub passed_count: usize,
    pub effective_count: usize,
    pub rule_results: Vec<RuleResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of one criteria against one subject.
///
/// `passed` is derived from the score and threshold; `groups_passed` is the
/// top-level group combination. Both are reported and never reconciled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub criteria_id: String,
    pub passed: bool,
    pub score: f64,
    pub decision: String,
    pub scoring_method: ScoringMethod,
    pub threshold: f64,
    pub groups_passed: bool,
    pub failed_rules: Vec<RuleResult>,
    pub group_results: Vec<GroupResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

impl EvaluationResult {
    /// Scoring and group combination reached different verdicts.
    pub fn disagrees(&self) -> bool {
        self.passed != self.groups_passed
    }

    /// Every rule result in group order.
    pub fn rule_results(&self) -> impl Iterator<Item = &RuleResult> {
        self.group_results.iter().flat_map(|g| g.rule_results.iter())
    }

    pub fn failed_rule_ids(&self) -> Vec<String> {
        self.failed_rules.iter().map(|r| r.rule_id.clone()).collect()
    }
}
