//! Criteria document schema types with serde deserialization.
//!
//! Defines the type hierarchy for criteria documents:
//! - `Criteria`: envelope (apiVersion, kind, metadata) plus `CriteriaSpec`
//! - `Group`: rules reduced by a `Combinator`
//! - `Rule` / `Condition`: field, `Operator`, expected value
//! - `ScoringMethod` and `DecisionBand` for the final score and label

mod combinator;
mod criteria;
mod metadata;
mod operator;

pub use combinator::*;
pub use criteria::*;
pub use metadata::*;
pub use operator::*;
