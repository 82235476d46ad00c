//! Envelope and scoring validation: apiVersion, kind, metadata, threshold, decisions.

use super::suggest::is_valid_id;
use super::ValidationResult;
use crate::decision::ThresholdTable;
use crate::schema::{Criteria, ScoringMethod};

// ── Envelope ────────────────────────────────────────────────────────

pub(super) fn validate_envelope(criteria: &Criteria, result: &mut ValidationResult) {
    if criteria.api_version != "v1" {
        result.error(
            "apiVersion",
            format!("apiVersion must be 'v1', got '{}'", criteria.api_version),
        );
    }

    if criteria.kind != "Criteria" {
        result.error(
            "kind",
            format!("kind must be 'Criteria', got '{}'", criteria.kind),
        );
    }

    if !is_valid_id(&criteria.metadata.id) {
        result.error(
            "metadata.id",
            format!(
                "id must be kebab-case (lowercase alphanumeric + hyphens), got '{}'",
                criteria.metadata.id
            ),
        );
    }

    if criteria.metadata.name.trim().is_empty() {
        result.warn("metadata.name", "name is empty");
    }

    if criteria.is_empty() {
        result.warn("spec", "criteria has no rules; every evaluation fails with score 0");
    }
}

// ── Scoring and decisions ───────────────────────────────────────────

pub(super) fn validate_scoring(criteria: &Criteria, result: &mut ValidationResult) {
    let spec = &criteria.spec;

    if !spec.threshold.is_finite() {
        result.error("spec.threshold", "threshold must be a finite number");
    } else {
        match spec.scoring_method {
            ScoringMethod::Weighted | ScoringMethod::Average
                if !(0.0..=100.0).contains(&spec.threshold) =>
            {
                result.warn(
                    "spec.threshold",
                    format!(
                        "threshold {} is outside the 0-100 range of {} scores",
                        spec.threshold, spec.scoring_method
                    ),
                );
            }
            _ => {}
        }
    }

    if let Some(bands) = &spec.decisions {
        for (i, band) in bands.iter().enumerate() {
            if band.label.trim().is_empty() {
                result.error(format!("spec.decisions[{i}].label"), "decision label is empty");
            }
        }
        if let Err(e) = ThresholdTable::new(bands.clone(), "") {
            result.error("spec.decisions", e.to_string());
        }
    }

    if let Some(label) = &spec.default_decision {
        if label.trim().is_empty() {
            result.error("spec.default_decision", "default decision label is empty");
        }
    }
}
