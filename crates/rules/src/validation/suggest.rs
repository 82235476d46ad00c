//! "Did you mean" lookups for misspelled names, and the criteria id format.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CRITERIA_ID: Regex = Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").unwrap();
}

/// Lowercase alphanumeric words joined by single hyphens, e.g. `loan-basic`.
pub(crate) fn is_valid_id(id: &str) -> bool {
    CRITERIA_ID.is_match(id)
}

/// The known name nearest to `input`, ignoring case.
///
/// Nothing is suggested when more than half the characters would have to change.
pub(crate) fn closest<'a>(input: &str, known: &[&'a str]) -> Option<&'a str> {
    let input = input.to_lowercase();
    known
        .iter()
        .map(|name| (*name, edit_distance(&input, &name.to_lowercase())))
        .min_by_key(|(_, distance)| *distance)
        .filter(|(name, distance)| *distance <= input.chars().count().max(name.chars().count()) / 2)
        .map(|(name, _)| name)
}

/// Single-character insertions, deletions and substitutions needed to turn `a` into `b`.
fn edit_distance(a: &str, b: &str) -> usize {
    let target: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=target.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in target.iter().enumerate() {
            let substitute = diagonal + usize::from(ca != *cb);
            diagonal = row[j + 1];
            row[j + 1] = substitute.min(row[j] + 1).min(diagonal + 1);
        }
    }

    row[target.len()]
}
