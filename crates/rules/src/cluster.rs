//! Implicit grouping for criteria that declare only flat rules.
//!
//! A run of consecutive rules sharing the same `group_logic` tag becomes one
//! group; untagged rules count as `all`. The first rule of a run supplies the
//! group's `min_required` and `boolean_expression`.

use crate::schema::{Group, Rule};

/// Prefix of generated group ids: `implicit-1`, `implicit-2`, …
pub const IMPLICIT_GROUP_PREFIX: &str = "implicit-";

/// Cluster flat rules into groups, preserving declaration order.
pub fn cluster(rules: &[Rule]) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();

    for rule in rules {
        let logic = rule.group_logic.unwrap_or_default();
        match groups.last_mut() {
            Some(current) if current.combination == logic => current.rules.push(rule.clone()),
            _ => {
                let id = format!("{IMPLICIT_GROUP_PREFIX}{}", groups.len() + 1);
                let mut group = Group::new(id, logic, vec![rule.clone()]);
                group.min_required = rule.group_min_required;
                group.boolean_expression = rule.group_expression.clone();
                groups.push(group);
            }
        }
    }

    groups
}
