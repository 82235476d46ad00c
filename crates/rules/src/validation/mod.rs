//! Criteria validation with structured errors and suggestions.
//!
//! Errors block loading a criteria document; warnings are advisory. The
//! evaluator does not depend on validation: anything flagged here as an
//! error still evaluates, failing the affected rule or group closed.

mod group_checks;
mod rule_checks;
mod schema_checks;

mod suggest;

use serde::{Deserialize, Serialize};

use crate::schema::{Criteria, COMBINATOR_NAMES, OPERATOR_NAMES, SCORING_METHOD_NAMES};

use suggest::closest;

// ── Result types ────────────────────────────────────────────────────

/// Overall validation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

/// A blocking validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// JSON-path-like location, e.g. `"spec.groups[0].rules[1].operator"`.
    pub path: String,
    pub message: String,
    /// Optional "Did you mean …?" suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// A non-blocking advisory warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationResult {
    pub(crate) fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        });
    }

    pub(crate) fn error_with_suggestion(
        &mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: Some(suggestion.into()),
        });
    }

    pub(crate) fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            path: path.into(),
            message: message.into(),
        });
    }

    /// One-line-per-finding summary, errors first.
    pub fn summary(&self) -> String {
        let errors = self.errors.iter().map(|e| match &e.suggestion {
            Some(s) => format!("error: {}: {} (did you mean '{s}'?)", e.path, e.message),
            None => format!("error: {}: {}", e.path, e.message),
        });
        let warnings = self
            .warnings
            .iter()
            .map(|w| format!("warning: {}: {}", w.path, w.message));
        errors.chain(warnings).collect::<Vec<_>>().join("\n")
    }
}

// ── Public API ──────────────────────────────────────────────────────

/// Validate a parsed [`Criteria`].
pub fn validate_criteria(criteria: &Criteria) -> ValidationResult {
    let mut result = ValidationResult::new();
    schema_checks::validate_envelope(criteria, &mut result);
    schema_checks::validate_scoring(criteria, &mut result);
    group_checks::validate_groups(criteria, &mut result);
    rule_checks::validate_rules(criteria, &mut result);
    result
}

/// Parse raw YAML and validate. Parse errors are reported as a single error,
/// with a suggestion when the problem is a misspelled enum value.
pub fn validate_yaml(yaml: &str) -> ValidationResult {
    match Criteria::from_yaml(yaml) {
        Ok(criteria) => validate_criteria(&criteria),
        Err(e) => {
            let mut result = ValidationResult::new();
            let message = format!("YAML parse error: {e}");
            match unknown_variant(&message).and_then(suggest_variant) {
                Some(suggestion) => result.error_with_suggestion("", message, suggestion),
                None => result.error("", message),
            }
            result
        }
    }
}

/// Pull `x` out of serde's "unknown variant `x`" message.
fn unknown_variant(message: &str) -> Option<&str> {
    let start = message.find("unknown variant `")? + "unknown variant `".len();
    let len = message[start..].find('`')?;
    Some(&message[start..start + len])
}

fn suggest_variant(input: &str) -> Option<String> {
    let candidates: Vec<&str> = COMBINATOR_NAMES
        .iter()
        .chain(SCORING_METHOD_NAMES)
        .copied()
        .collect();
    closest(input, &candidates).map(str::to_string)
}

/// Suggest the closest known operator name.
pub(crate) fn suggest_operator(input: &str) -> Option<&'static str> {
    closest(input, OPERATOR_NAMES)
}
