//! Combination logic and scoring method enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a set of pass/fail outcomes reduces to one boolean.
///
/// Shared by groups (over rule outcomes) and criteria (over group outcomes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combinator {
    #[default]
    #[serde(alias = "and", alias = "ALL", alias = "AND")]
    All,
    #[serde(alias = "or", alias = "ANY", alias = "OR")]
    Any,
    #[serde(alias = "min_n", alias = "at_least", alias = "MIN")]
    Min,
    #[serde(alias = "MAJORITY")]
    Majority,
    #[serde(alias = "custom", alias = "expression", alias = "BOOLEAN")]
    Boolean,
}

/// Canonical combinator names, used for suggestions in validation.
pub const COMBINATOR_NAMES: &[&str] = &["all", "any", "min", "majority", "boolean"];

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::All => write!(f, "ALL"),
            Combinator::Any => write!(f, "ANY"),
            Combinator::Min => write!(f, "MIN"),
            Combinator::Majority => write!(f, "MAJORITY"),
            Combinator::Boolean => write!(f, "BOOLEAN"),
        }
    }
}

/// Score algebra applied once per criteria over all non-skipped rule results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
    /// Passed weight over total weight, as a percentage.
    #[default]
    #[serde(alias = "percentage", alias = "WEIGHTED")]
    Weighted,
    /// 100 when every rule passed, otherwise 0.
    #[serde(alias = "binary", alias = "PASS_FAIL")]
    PassFail,
    /// Raw sum of passed weights, unbounded.
    #[serde(alias = "SUM")]
    Sum,
    /// Passed count over rule count, as a percentage; weights ignored.
    #[serde(alias = "AVERAGE")]
    Average,
}

/// Canonical scoring method names, used for suggestions in validation.
pub const SCORING_METHOD_NAMES: &[&str] = &["weighted", "pass_fail", "sum", "average"];

impl fmt::Display for ScoringMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringMethod::Weighted => write!(f, "weighted"),
            ScoringMethod::PassFail => write!(f, "pass_fail"),
            ScoringMethod::Sum => write!(f, "sum"),
            ScoringMethod::Average => write!(f, "average"),
        }
    }
}
