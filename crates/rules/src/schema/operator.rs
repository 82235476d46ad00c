//! Comparison operators for rules and dependency conditions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operator applied between a subject value and an expected value.
///
/// Parsing is infallible: unrecognised names become [`Operator::Unknown`] so one
/// malformed rule fails closed without rejecting the whole criteria document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Between,
    NotBetween,
    Empty,
    NotEmpty,
    Exists,
    NotExists,
    StartsWith,
    EndsWith,
    Contains,
    Regex,
    Before,
    After,
    DateBetween,
    Unknown(String),
}

/// Canonical operator names, used for suggestions in validation.
pub const OPERATOR_NAMES: &[&str] = &[
    "eq",
    "neq",
    "gt",
    "gte",
    "lt",
    "lte",
    "in",
    "not_in",
    "between",
    "not_between",
    "empty",
    "not_empty",
    "exists",
    "not_exists",
    "starts_with",
    "ends_with",
    "contains",
    "regex",
    "before",
    "after",
    "date_between",
];

impl Operator {
    /// Parse an operator name or symbol; never fails.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase().replace(|c: char| c == '-' || c == ' ', "_");
        match normalized.as_str() {
            "eq" | "=" | "==" | "equals" => Operator::Eq,
            "neq" | "ne" | "!=" | "<>" | "not_equals" => Operator::Neq,
            "gt" | ">" => Operator::Gt,
            "gte" | "ge" | ">=" => Operator::Gte,
            "lt" | "<" => Operator::Lt,
            "lte" | "le" | "<=" => Operator::Lte,
            "in" => Operator::In,
            "not_in" | "nin" => Operator::NotIn,
            "between" => Operator::Between,
            "not_between" => Operator::NotBetween,
            "empty" | "is_empty" => Operator::Empty,
            "not_empty" | "is_not_empty" => Operator::NotEmpty,
            "exists" => Operator::Exists,
            "not_exists" => Operator::NotExists,
            "starts_with" => Operator::StartsWith,
            "ends_with" => Operator::EndsWith,
            "contains" => Operator::Contains,
            "regex" | "matches" => Operator::Regex,
            "before" | "date_before" => Operator::Before,
            "after" | "date_after" => Operator::After,
            "date_between" => Operator::DateBetween,
            _ => Operator::Unknown(raw.to_string()),
        }
    }

    /// Canonical snake_case name.
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Between => "between",
            Operator::NotBetween => "not_between",
            Operator::Empty => "empty",
            Operator::NotEmpty => "not_empty",
            Operator::Exists => "exists",
            Operator::NotExists => "not_exists",
            Operator::StartsWith => "starts_with",
            Operator::EndsWith => "ends_with",
            Operator::Contains => "contains",
            Operator::Regex => "regex",
            Operator::Before => "before",
            Operator::After => "after",
            Operator::DateBetween => "date_between",
            Operator::Unknown(raw) => raw.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Operator::Unknown(_))
    }

    /// Operators that ignore the expected value entirely.
    pub fn is_unary(&self) -> bool {
        matches!(
            self,
            Operator::Empty | Operator::NotEmpty | Operator::Exists | Operator::NotExists
        )
    }
}

impl From<String> for Operator {
    fn from(raw: String) -> Self {
        Operator::parse(&raw)
    }
}

impl From<&str> for Operator {
    fn from(raw: &str) -> Self {
        Operator::parse(raw)
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.as_str().to_string()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
