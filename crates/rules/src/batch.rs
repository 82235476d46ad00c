//! Parallel evaluation of many subjects against one criteria.
//!
//! Subjects are split into chunks of `chunk_size`; chunks are evaluated on the
//! rayon pool and results come back in input order.

use rayon::prelude::*;
use tracing::debug;
use verdict_core::Subject;

use crate::cache::{CacheError, CachedEvaluation, CachedEvaluator};
use crate::evaluator::{CriteriaEvaluator, EvaluationResult};
use crate::schema::Criteria;

/// Evaluate `subjects` in parallel without caching.
pub fn evaluate_batch(
    evaluator: &CriteriaEvaluator,
    criteria: &Criteria,
    subjects: &[Subject],
    chunk_size: usize,
) -> Vec<EvaluationResult> {
    let chunk_size = chunk_size.max(1);
    debug!(
        criteria_id = %criteria.id(),
        subjects = subjects.len(),
        chunk_size,
        "batch evaluation"
    );

    subjects
        .par_chunks(chunk_size)
        .map(|chunk| {
            chunk
                .iter()
                .map(|subject| evaluator.evaluate(criteria, subject))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

/// Evaluate `subjects` in parallel through the cache.
///
/// The first cache error aborts the batch.
pub fn evaluate_batch_cached(
    cached: &CachedEvaluator,
    criteria: &Criteria,
    subjects: &[Subject],
    chunk_size: usize,
) -> Result<Vec<CachedEvaluation>, CacheError> {
    let chunk_size = chunk_size.max(1);
    let chunks = subjects
        .par_chunks(chunk_size)
        .map(|chunk| {
            chunk
                .iter()
                .map(|subject| cached.evaluate_detailed(criteria, subject))
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(chunks.into_iter().flatten().collect())
}
