//! Evaluation cache facade.
//!
//! Results are memoized under `(namespace, criteria id, subject hash)`, where
//! the subject hash is the SHA-256 of the subject's canonical JSON. The
//! criteria id doubles as the invalidation tag. Backends without tag support
//! are invalidated by flushing the whole namespace.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use lru::LruCache;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};
use verdict_core::config::CacheConfig;
use verdict_core::Subject;

use crate::evaluator::{CriteriaEvaluator, EvaluationResult};
use crate::schema::Criteria;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("cache operation not supported: {0}")]
    Unsupported(&'static str),
}

// ── Keys ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub namespace: String,
    pub criteria_id: String,
    pub subject_hash: String,
}

impl CacheKey {
    pub fn new(namespace: impl Into<String>, criteria_id: impl Into<String>, subject: &Subject) -> Self {
        Self {
            namespace: namespace.into(),
            criteria_id: criteria_id.into(),
            subject_hash: subject_hash(subject),
        }
    }

    /// Invalidation tag: the criteria identity.
    pub fn tag(&self) -> &str {
        &self.criteria_id
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.namespace, self.criteria_id, self.subject_hash)
    }
}

/// SHA-256 hex digest of the subject's canonical (key-sorted) JSON.
pub fn subject_hash(subject: &Subject) -> String {
    let digest = Sha256::digest(subject.canonical_json().as_bytes());
    format!("{digest:x}")
}

// ── Backends ────────────────────────────────────────────────────────

/// Storage behind the cache facade.
pub trait CacheBackend: Send + Sync {
    fn get(&self, key: &CacheKey) -> Result<Option<EvaluationResult>, CacheError>;

    fn put(&self, key: CacheKey, value: EvaluationResult, ttl: Duration) -> Result<(), CacheError>;

    /// Drop every entry tagged `tag`, returning how many were removed.
    fn invalidate_tag(&self, tag: &str) -> Result<usize, CacheError>;

    /// Drop every entry in `namespace`, returning how many were removed.
    fn flush_namespace(&self, namespace: &str) -> Result<usize, CacheError>;

    fn supports_tags(&self) -> bool;
}

struct Entry {
    value: EvaluationResult,
    expires_at: Instant,
}

/// Capacity-bounded in-process LRU with per-entry expiry.
pub struct InMemoryCache {
    entries: Mutex<LruCache<CacheKey, Entry>>,
}

impl InMemoryCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, LruCache<CacheKey, Entry>>, CacheError> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Unavailable("in-memory cache lock poisoned".to_string()))
    }

    fn remove_where(&self, pred: impl Fn(&CacheKey) -> bool) -> Result<usize, CacheError> {
        let mut entries = self.lock()?;
        let doomed: Vec<CacheKey> = entries
            .iter()
            .filter(|(key, _)| pred(key))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            entries.pop(key);
        }
        Ok(doomed.len())
    }
}

impl CacheBackend for InMemoryCache {
    fn get(&self, key: &CacheKey) -> Result<Option<EvaluationResult>, CacheError> {
        let mut entries = self.lock()?;
        let expired = match entries.get(key) {
            None => return Ok(None),
            Some(entry) if Instant::now() < entry.expires_at => return Ok(Some(entry.value.clone())),
            Some(_) => true,
        };
        if expired {
            entries.pop(key);
        }
        Ok(None)
    }

    fn put(&self, key: CacheKey, value: EvaluationResult, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = Instant::now() + ttl;
        self.lock()?.put(key, Entry { value, expires_at });
        Ok(())
    }

    fn invalidate_tag(&self, tag: &str) -> Result<usize, CacheError> {
        self.remove_where(|key| key.tag() == tag)
    }

    fn flush_namespace(&self, namespace: &str) -> Result<usize, CacheError> {
        self.remove_where(|key| key.namespace == namespace)
    }

    fn supports_tags(&self) -> bool {
        true
    }
}

/// Backend that never stores anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

impl CacheBackend for NoopCache {
    fn get(&self, _key: &CacheKey) -> Result<Option<EvaluationResult>, CacheError> {
        Ok(None)
    }

    fn put(&self, _key: CacheKey, _value: EvaluationResult, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }

    fn invalidate_tag(&self, _tag: &str) -> Result<usize, CacheError> {
        Ok(0)
    }

    fn flush_namespace(&self, _namespace: &str) -> Result<usize, CacheError> {
        Ok(0)
    }

    fn supports_tags(&self) -> bool {
        true
    }
}

// ── Facade ──────────────────────────────────────────────────────────

/// Hit/miss counters since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// One evaluation together with how it was obtained.
#[derive(Debug, Clone)]
pub struct CachedEvaluation {
    pub result: EvaluationResult,
    pub subject_hash: String,
    pub cache_hit: bool,
}

/// [`CriteriaEvaluator`] wrapped in a memoization layer.
///
/// Concurrent misses on the same key each compute; the last write wins.
pub struct CachedEvaluator {
    evaluator: CriteriaEvaluator,
    backend: Arc<dyn CacheBackend>,
    namespace: String,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CachedEvaluator {
    pub fn new(
        evaluator: CriteriaEvaluator,
        backend: Arc<dyn CacheBackend>,
        namespace: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            evaluator,
            backend,
            namespace: namespace.into(),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// In-memory LRU when caching is enabled, otherwise [`NoopCache`].
    pub fn from_config(config: &CacheConfig, evaluator: CriteriaEvaluator) -> Self {
        let backend: Arc<dyn CacheBackend> = if config.enabled {
            Arc::new(InMemoryCache::new(config.capacity))
        } else {
            Arc::new(NoopCache)
        };
        Self::new(evaluator, backend, config.namespace.clone(), config.ttl())
    }

    pub fn evaluator(&self) -> &CriteriaEvaluator {
        &self.evaluator
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Evaluate through the cache.
    pub fn evaluate(&self, criteria: &Criteria, subject: &Subject) -> Result<EvaluationResult, CacheError> {
        self.evaluate_detailed(criteria, subject).map(|cached| cached.result)
    }

    /// Evaluate through the cache, reporting the subject hash and hit status.
    ///
    /// A failing `get` is returned as an error. A failing `put` is logged and
    /// the freshly computed result is still returned.
    pub fn evaluate_detailed(
        &self,
        criteria: &Criteria,
        subject: &Subject,
    ) -> Result<CachedEvaluation, CacheError> {
        let key = CacheKey::new(self.namespace.as_str(), criteria.id(), subject);

        if let Some(result) = self.backend.get(&key)? {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "evaluation cache hit");
            return Ok(CachedEvaluation {
                result,
                subject_hash: key.subject_hash,
                cache_hit: true,
            });
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, "evaluation cache miss");
        let result = self.evaluator.evaluate(criteria, subject);
        let subject_hash = key.subject_hash.clone();
        if let Err(e) = self.backend.put(key, result.clone(), self.ttl) {
            warn!(criteria_id = %criteria.id(), error = %e, "failed to store evaluation in cache");
        }

        Ok(CachedEvaluation {
            result,
            subject_hash,
            cache_hit: false,
        })
    }

    /// Invalidate every cached evaluation of `criteria_id`.
    ///
    /// Falls back to flushing the whole namespace when the backend has no tags.
    pub fn invalidate_criteria(&self, criteria_id: &str) -> Result<usize, CacheError> {
        if self.backend.supports_tags() {
            let removed = self.backend.invalidate_tag(criteria_id)?;
            info!(criteria_id = %criteria_id, removed, "invalidated cached evaluations");
            Ok(removed)
        } else {
            warn!(
                criteria_id = %criteria_id,
                namespace = %self.namespace,
                "cache backend has no tag support, flushing namespace"
            );
            self.backend.flush_namespace(&self.namespace)
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
