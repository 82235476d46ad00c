//! Eligibility criteria engine.
//!
//! This crate provides:
//! - YAML criteria documents (groups of rules) with serde deserialization
//! - Value comparison, dependency gating and group combinators
//!   (ALL, ANY, MIN, MAJORITY and boolean expressions)
//! - Weighted, pass/fail, sum and average scoring with decision labels
//! - Validation with "did you mean" suggestions
//! - A tag-invalidated evaluation cache, rayon batch evaluation and an audit log
//! - Filesystem loader with hot-reload via `notify` watcher

pub mod audit_log;
pub mod batch;
pub mod cache;
pub mod cluster;
pub mod comparator;
pub mod decision;
pub mod evaluator;
pub mod expression;
pub mod loader;
pub mod schema;
pub mod scoring;
pub mod service;
pub mod validation;

pub use cache::{CacheBackend, CachedEvaluator, InMemoryCache};
pub use evaluator::{CriteriaEvaluator, EvaluationResult, GroupResult, RuleResult};
pub use loader::{CriteriaLoader, RuleError};
pub use schema::Criteria;
pub use service::{CriteriaSource, EvaluationService};
pub use validation::{validate_criteria, validate_yaml, ValidationResult};
