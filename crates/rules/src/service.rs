//! Evaluation service: resolves criteria by id, evaluates through the cache
//! and records audit entries.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};
use verdict_core::{EngineConfig, Subject};

use crate::audit_log::{AuditEntry, AuditSink};
use crate::batch::evaluate_batch_cached;
use crate::cache::{CachedEvaluation, CachedEvaluator};
use crate::evaluator::{CriteriaEvaluator, EvaluationResult};
use crate::loader::{Result, RuleError};
use crate::schema::Criteria;

/// Anything that can hand out criteria by id.
pub trait CriteriaSource: Send + Sync {
    fn criteria(&self, id: &str) -> Option<Criteria>;

    /// Known criteria ids, sorted.
    fn ids(&self) -> Vec<String>;
}

impl CriteriaSource for HashMap<String, Criteria> {
    fn criteria(&self, id: &str) -> Option<Criteria> {
        self.get(id).cloned()
    }

    fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.keys().cloned().collect();
        ids.sort();
        ids
    }
}

/// Change callback that drops cached evaluations of the changed criteria.
///
/// Failures are logged; a reload must not stop on a cache error.
pub fn invalidate_on_change(cached: Arc<CachedEvaluator>) -> impl Fn(&str) + Send + Sync + 'static {
    move |criteria_id: &str| {
        if let Err(e) = cached.invalidate_criteria(criteria_id) {
            warn!(criteria_id = %criteria_id, error = %e, "failed to invalidate cache after reload");
        }
    }
}

/// Id-addressed evaluation over a [`CriteriaSource`].
pub struct EvaluationService {
    source: Arc<dyn CriteriaSource>,
    cached: Arc<CachedEvaluator>,
    audit: Option<Arc<dyn AuditSink>>,
    chunk_size: usize,
}

impl EvaluationService {
    pub fn new(source: Arc<dyn CriteriaSource>, cached: Arc<CachedEvaluator>) -> Self {
        Self {
            source,
            cached,
            audit: None,
            chunk_size: 256,
        }
    }

    /// Cache, default decision and chunk size taken from `config`.
    pub fn from_config(config: &EngineConfig, source: Arc<dyn CriteriaSource>) -> Self {
        let evaluator = CriteriaEvaluator::with_default_decision(config.default_decision.clone());
        let cached = CachedEvaluator::from_config(&config.cache, evaluator);
        Self::new(source, Arc::new(cached)).with_chunk_size(config.batch_chunk_size)
    }

    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn cached(&self) -> &Arc<CachedEvaluator> {
        &self.cached
    }

    pub fn source(&self) -> &Arc<dyn CriteriaSource> {
        &self.source
    }

    /// Evaluate `subject` against the criteria registered as `criteria_id`.
    pub fn evaluate(&self, criteria_id: &str, subject: &Subject) -> Result<EvaluationResult> {
        let criteria = self.resolve(criteria_id)?;
        let evaluation = self.cached.evaluate_detailed(&criteria, subject)?;
        self.record(&evaluation);
        Ok(evaluation.result)
    }

    /// Evaluate many subjects in parallel; results keep input order.
    pub fn evaluate_batch(&self, criteria_id: &str, subjects: &[Subject]) -> Result<Vec<EvaluationResult>> {
        let criteria = self.resolve(criteria_id)?;
        let evaluations = evaluate_batch_cached(&self.cached, &criteria, subjects, self.chunk_size)?;
        Ok(evaluations
            .into_iter()
            .map(|evaluation| {
                self.record(&evaluation);
                evaluation.result
            })
            .collect())
    }

    /// Drop cached evaluations of `criteria_id`. Returns the number of entries removed.
    pub fn invalidate(&self, criteria_id: &str) -> Result<usize> {
        Ok(self.cached.invalidate_criteria(criteria_id)?)
    }

    /// Callback for [`CriteriaLoader::watch`](crate::loader::CriteriaLoader::watch)
    /// that invalidates the cache of every changed criteria.
    pub fn invalidator(&self) -> impl Fn(&str) + Send + Sync + 'static {
        invalidate_on_change(Arc::clone(&self.cached))
    }

    fn resolve(&self, criteria_id: &str) -> Result<Criteria> {
        let criteria = self
            .source
            .criteria(criteria_id)
            .ok_or_else(|| RuleError::CriteriaNotFound(criteria_id.to_string()))?;
        if !criteria.is_enabled() {
            return Err(RuleError::CriteriaDisabled(criteria_id.to_string()));
        }
        Ok(criteria)
    }

    fn record(&self, evaluation: &CachedEvaluation) {
        if let Some(sink) = &self.audit {
            debug!(criteria_id = %evaluation.result.criteria_id, "recording audit entry");
            sink.record(AuditEntry::from_evaluation(evaluation));
        }
    }
}
