//! Filesystem criteria loader with hot-reload via `notify` watcher.
//!
//! Watches the criteria directory for YAML file changes (create, modify,
//! delete), reloads affected documents into the in-memory set and reports
//! each changed criteria id so cached evaluations can be invalidated.

mod core;
mod error;
mod watcher;

#[cfg(test)]
mod tests;

pub use self::core::CriteriaLoader;
pub use self::error::{LoadResult, LoadStatus, Result, RuleError};
