//! In-memory audit trail of criteria evaluations.
//!
//! Stores per-criteria entries capped at a configurable maximum (default 500)
//! with FIFO eviction. Durable persistence is left to other [`AuditSink`]
//! implementations.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::CachedEvaluation;

/// Default number of entries kept per criteria.
pub const DEFAULT_MAX_ENTRIES: usize = 500;

/// Receives one record per completed evaluation.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry);
}

/// Summary of one evaluation, detailed enough to explain the outcome later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub criteria_id: String,
    /// SHA-256 of the subject's canonical JSON; the subject itself is not kept.
    pub subject_hash: String,
    pub passed: bool,
    pub score: f64,
    pub decision: String,
    pub failed_rule_ids: Vec<String>,
    pub cache_hit: bool,
}

impl AuditEntry {
    pub fn from_evaluation(evaluation: &CachedEvaluation) -> Self {
        let result = &evaluation.result;
        Self {
            timestamp: Utc::now(),
            criteria_id: result.criteria_id.clone(),
            subject_hash: evaluation.subject_hash.clone(),
            passed: result.passed,
            score: result.score,
            decision: result.decision.clone(),
            failed_rule_ids: result.failed_rule_ids(),
            cache_hit: evaluation.cache_hit,
        }
    }
}

/// Filters for [`AuditLog::query`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    /// Only entries with this outcome.
    pub passed: Option<bool>,
    /// Maximum number of entries to return (default 100).
    pub limit: Option<usize>,
    /// Only entries at or after this instant.
    pub since: Option<DateTime<Utc>>,
}

/// In-memory per-criteria audit log with FIFO eviction.
#[derive(Clone)]
pub struct AuditLog {
    entries: Arc<RwLock<HashMap<String, VecDeque<AuditEntry>>>>,
    max_entries_per_criteria: usize,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }

    pub fn with_max_entries(max: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            max_entries_per_criteria: max.max(1),
        }
    }

    /// Entries for `criteria_id`, newest first.
    pub fn query(&self, criteria_id: &str, query: &AuditQuery) -> Vec<AuditEntry> {
        let guard = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let Some(deque) = guard.get(criteria_id) else {
            return Vec::new();
        };

        deque
            .iter()
            .rev()
            .filter(|e| query.passed.map_or(true, |p| e.passed == p))
            .filter(|e| query.since.map_or(true, |s| e.timestamp >= s))
            .take(query.limit.unwrap_or(100))
            .cloned()
            .collect()
    }

    /// Number of retained entries for `criteria_id`.
    pub fn len(&self, criteria_id: &str) -> usize {
        let guard = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        guard.get(criteria_id).map_or(0, VecDeque::len)
    }

    pub fn clear(&self, criteria_id: &str) {
        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        guard.remove(criteria_id);
    }
}

impl AuditSink for AuditLog {
    fn record(&self, entry: AuditEntry) {
        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let deque = guard.entry(entry.criteria_id.clone()).or_default();
        deque.push_back(entry);
        while deque.len() > self.max_entries_per_criteria {
            deque.pop_front();
        }
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(criteria_id: &str, passed: bool, score: f64) -> AuditEntry {
        AuditEntry {
            timestamp: Utc::now(),
            criteria_id: criteria_id.to_string(),
            subject_hash: "abc".to_string(),
            passed,
            score,
            decision: if passed { "Good" } else { "Rejected" }.to_string(),
            failed_rule_ids: Vec::new(),
            cache_hit: false,
        }
    }

    #[test]
    fn newest_first() {
        let log = AuditLog::new();
        log.record(entry("loan", true, 80.0));
        log.record(entry("loan", false, 20.0));
        log.record(entry("loan", true, 95.0));

        let entries = log.query("loan", &AuditQuery::default());
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].score, 95.0);
        assert_eq!(entries[2].score, 80.0);
    }

    #[test]
    fn outcome_filter() {
        let log = AuditLog::new();
        log.record(entry("loan", true, 80.0));
        log.record(entry("loan", false, 20.0));

        let query = AuditQuery {
            passed: Some(false),
            ..AuditQuery::default()
        };
        let entries = log.query("loan", &query);
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].passed);
    }

    #[test]
    fn since_filter() {
        let log = AuditLog::new();
        let mut old = entry("loan", true, 80.0);
        old.timestamp = Utc::now() - Duration::hours(2);
        log.record(old);
        log.record(entry("loan", true, 90.0));

        let query = AuditQuery {
            since: Some(Utc::now() - Duration::hours(1)),
            ..AuditQuery::default()
        };
        assert_eq!(log.query("loan", &query).len(), 1);
    }

    #[test]
    fn limit() {
        let log = AuditLog::new();
        for i in 0..10 {
            log.record(entry("loan", true, i as f64));
        }
        let query = AuditQuery {
            limit: Some(3),
            ..AuditQuery::default()
        };
        assert_eq!(log.query("loan", &query).len(), 3);
    }

    #[test]
    fn fifo_eviction() {
        let log = AuditLog::with_max_entries(3);
        for i in 1..=4 {
            log.record(entry("loan", true, i as f64));
        }
        let entries = log.query("loan", &AuditQuery::default());
        assert_eq!(log.len("loan"), 3);
        assert_eq!(entries[0].score, 4.0);
        assert_eq!(entries[2].score, 2.0);
    }

    #[test]
    fn per_criteria_isolation_and_clear() {
        let log = AuditLog::new();
        log.record(entry("loan", true, 80.0));
        log.record(entry("card", false, 10.0));
        assert_eq!(log.len("loan"), 1);
        assert_eq!(log.len("card"), 1);

        log.clear("loan");
        assert!(log.query("loan", &AuditQuery::default()).is_empty());
        assert_eq!(log.len("card"), 1);
        assert!(log.query("missing", &AuditQuery::default()).is_empty());
    }
}
