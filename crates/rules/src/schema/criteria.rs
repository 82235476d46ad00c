//! Criteria document types: criteria, groups, rules and dependency conditions.

use serde::{Deserialize, Serialize};
use verdict_core::Value;

use super::metadata::default_true;
use super::{Combinator, CommonMetadata, Operator, ScoringMethod};

/// Top-level criteria document.
///
/// ```yaml
/// apiVersion: v1
/// kind: Criteria
/// metadata: { id: loan-basic, name: Basic loan eligibility }
/// spec:
///   scoring_method: weighted
///   threshold: 70
///   groups: [...]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Criteria {
    #[serde(rename = "apiVersion", default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    pub metadata: CommonMetadata,
    pub spec: CriteriaSpec,
}

/// Evaluation settings and rule tree of a criteria.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CriteriaSpec {
    /// Minimum score to pass under weighted/sum/average scoring.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub scoring_method: ScoringMethod,
    /// Top-level combination over group outcomes.
    #[serde(default)]
    pub combination: Combinator,
    #[serde(default)]
    pub min_required: Option<u32>,
    #[serde(default)]
    pub boolean_expression: Option<String>,
    /// Custom decision bands; the built-in table is used when absent.
    #[serde(default)]
    pub decisions: Option<Vec<DecisionBand>>,
    #[serde(default)]
    pub default_decision: Option<String>,
    #[serde(default)]
    pub groups: Vec<Group>,
    /// Ungrouped rules, clustered by `group_logic` when `groups` is empty.
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// A named set of rules reduced by one combinator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Group {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "logic")]
    pub combination: Combinator,
    /// Only read by [`Combinator::Min`].
    #[serde(default)]
    pub min_required: Option<u32>,
    /// Only read by [`Combinator::Boolean`]; letters `a`, `b`, … name the
    /// non-skipped rules in declaration order.
    #[serde(default)]
    pub boolean_expression: Option<String>,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// One atomic field/operator/expected-value condition with a weight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    pub field: String,
    pub operator: Operator,
    #[serde(default, alias = "value")]
    pub expected: Value,
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Prerequisites; when any fails the rule is skipped rather than failed.
    #[serde(default)]
    pub dependencies: Vec<Condition>,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Legacy grouping tag for criteria without explicit groups.
    #[serde(default)]
    pub group_logic: Option<Combinator>,
    #[serde(default)]
    pub group_min_required: Option<u32>,
    #[serde(default)]
    pub group_expression: Option<String>,
}

/// A dependency prerequisite: a rule without identity or weight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    #[serde(default, alias = "value")]
    pub expected: Value,
}

/// One row of a decision threshold table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DecisionBand {
    /// Inclusive lower bound of the band.
    pub min_score: f64,
    pub label: String,
}

fn default_api_version() -> String {
    "v1".to_string()
}

fn default_kind() -> String {
    "Criteria".to_string()
}

fn default_threshold() -> f64 {
    70.0
}

fn default_weight() -> f64 {
    1.0
}

// ── Constructors and accessors ──────────────────────────────────────

impl Criteria {
    pub fn new(metadata: CommonMetadata, spec: CriteriaSpec) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            metadata,
            spec,
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub fn is_enabled(&self) -> bool {
        self.metadata.enabled
    }

    /// True when the criteria has neither groups nor ungrouped rules.
    pub fn is_empty(&self) -> bool {
        self.spec.groups.iter().all(|g| g.rules.is_empty()) && self.spec.rules.is_empty()
    }

    /// Every rule in declaration order, grouped ones first.
    pub fn all_rules(&self) -> impl Iterator<Item = &Rule> {
        self.spec
            .groups
            .iter()
            .flat_map(|g| g.rules.iter())
            .chain(self.spec.rules.iter())
    }
}

impl Default for CriteriaSpec {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            scoring_method: ScoringMethod::default(),
            combination: Combinator::default(),
            min_required: None,
            boolean_expression: None,
            decisions: None,
            default_decision: None,
            groups: Vec::new(),
            rules: Vec::new(),
        }
    }
}

impl Group {
    pub fn new(id: impl Into<String>, combination: Combinator, rules: Vec<Rule>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            combination,
            min_required: None,
            boolean_expression: None,
            weight: default_weight(),
            rules,
        }
    }

    pub fn with_min_required(mut self, min: u32) -> Self {
        self.min_required = Some(min);
        self
    }

    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.boolean_expression = Some(expression.into());
        self
    }
}

impl Rule {
    pub fn new(
        id: impl Into<String>,
        field: impl Into<String>,
        operator: impl Into<Operator>,
        expected: impl Into<Value>,
    ) -> Self {
        Self {
            id: id.into(),
            description: None,
            field: field.into(),
            operator: operator.into(),
            expected: expected.into(),
            weight: default_weight(),
            dependencies: Vec::new(),
            active: true,
            group_logic: None,
            group_min_required: None,
            group_expression: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn depends_on(mut self, condition: Condition) -> Self {
        self.dependencies.push(condition);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn tagged(mut self, logic: Combinator) -> Self {
        self.group_logic = Some(logic);
        self
    }
}

impl Condition {
    pub fn new(
        field: impl Into<String>,
        operator: impl Into<Operator>,
        expected: impl Into<Value>,
    ) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            expected: expected.into(),
        }
    }
}
