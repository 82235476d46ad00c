//! Score → decision label mapping.

use thiserror::Error;

use crate::schema::{CriteriaSpec, DecisionBand};

/// Label used when no band matches and nothing else is configured.
pub const DEFAULT_DECISION: &str = "Rejected";

const BUILTIN_BANDS: &[(f64, &str)] = &[
    (90.0, "Excellent"),
    (80.0, "Very Good"),
    (70.0, "Good"),
    (50.0, "Needs Improvement"),
    (30.0, "Poor"),
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    #[error("duplicate decision threshold {0}")]
    Duplicate(f64),

    #[error("decision threshold for '{0}' is not a finite number")]
    NonFinite(String),
}

/// Ordered decision bands plus the label for scores below every band.
///
/// Bands are kept sorted by descending `min_score`; [`label`](Self::label)
/// returns the first band whose bound is at or below the score.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTable {
    bands: Vec<DecisionBand>,
    default_label: String,
}

impl ThresholdTable {
    pub fn new(
        mut bands: Vec<DecisionBand>,
        default_label: impl Into<String>,
    ) -> Result<Self, ThresholdError> {
        if let Some(band) = bands.iter().find(|b| !b.min_score.is_finite()) {
            return Err(ThresholdError::NonFinite(band.label.clone()));
        }
        bands.sort_by(|a, b| b.min_score.total_cmp(&a.min_score));
        if let Some(pair) = bands.windows(2).find(|w| w[0].min_score == w[1].min_score) {
            return Err(ThresholdError::Duplicate(pair[0].min_score));
        }
        Ok(Self {
            bands,
            default_label: default_label.into(),
        })
    }

    /// Excellent / Very Good / Good / Needs Improvement / Poor, with
    /// `default_label` below 30.
    pub fn builtin(default_label: impl Into<String>) -> Self {
        Self {
            bands: BUILTIN_BANDS
                .iter()
                .map(|(min_score, label)| DecisionBand {
                    min_score: *min_score,
                    label: label.to_string(),
                })
                .collect(),
            default_label: default_label.into(),
        }
    }

    /// Table for a criteria: its own bands when declared, else the built-in
    /// ones. `spec.default_decision` overrides `fallback_label`.
    pub fn for_criteria(spec: &CriteriaSpec, fallback_label: &str) -> Result<Self, ThresholdError> {
        let default_label = spec
            .default_decision
            .clone()
            .unwrap_or_else(|| fallback_label.to_string());
        match &spec.decisions {
            Some(bands) => Self::new(bands.clone(), default_label),
            None => Ok(Self::builtin(default_label)),
        }
    }

    /// Label of the greatest threshold not above `score`.
    pub fn label(&self, score: f64) -> &str {
        self.bands
            .iter()
            .find(|band| band.min_score <= score)
            .map(|band| band.label.as_str())
            .unwrap_or(&self.default_label)
    }

    pub fn bands(&self) -> &[DecisionBand] {
        &self.bands
    }

    pub fn default_label(&self) -> &str {
        &self.default_label
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self::builtin(DEFAULT_DECISION)
    }
}
