//! Value comparator: one subject value against one expected value.
//!
//! [`compare`] is total. Type mismatches, missing fields, unparsable dates and
//! malformed expectations all evaluate to `false` (fail closed). Shape problems
//! in the expected value can be surfaced separately through [`check_expected`],
//! which the rule evaluator uses to attach a diagnostic to the result.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use lru::LruCache;
use regex::Regex;
use tracing::{trace, warn};
use verdict_core::Value;

use crate::schema::Operator;

const PATTERN_CACHE_SIZE: usize = 256;

lazy_static! {
    /// Compiled patterns keyed by source text, including failed compilations.
    static ref PATTERN_CACHE: Mutex<LruCache<String, Result<Regex, String>>> = Mutex::new(
        LruCache::new(NonZeroUsize::new(PATTERN_CACHE_SIZE).expect("pattern cache capacity is non-zero"))
    );
}

// ── Entry points ────────────────────────────────────────────────────

/// Compare a looked-up subject value against `expected` with `operator`.
///
/// `actual` is `None` when the field path is absent from the subject, which
/// only `EXISTS`/`NOT_EXISTS`, `EMPTY`/`NOT_EMPTY` and `NOT_IN` distinguish
/// from a present `null`.
pub fn compare(actual: Option<&Value>, operator: &Operator, expected: &Value) -> bool {
    let present = actual.unwrap_or(&Value::Null);
    match operator {
        Operator::Eq => loose_eq(present, expected),
        Operator::Neq => !loose_eq(present, expected),
        Operator::Gt => compare_numbers(present, expected, |a, b| a > b),
        Operator::Gte => compare_numbers(present, expected, |a, b| a >= b),
        Operator::Lt => compare_numbers(present, expected, |a, b| a < b),
        Operator::Lte => compare_numbers(present, expected, |a, b| a <= b),
        Operator::In => match value_set(expected) {
            Some(set) if !present.is_null() => is_member(present, set),
            _ => false,
        },
        Operator::NotIn => match value_set(expected) {
            Some(set) => present.is_null() || !is_member(present, set),
            None => false,
        },
        Operator::Between => numeric_range(expected)
            .zip(present.as_number())
            .map(|((low, high), x)| low <= x && x <= high)
            .unwrap_or(false),
        Operator::NotBetween => numeric_range(expected)
            .zip(present.as_number())
            .map(|((low, high), x)| x < low || x > high)
            .unwrap_or(false),
        Operator::Empty => is_empty(actual),
        Operator::NotEmpty => !is_empty(actual),
        Operator::Exists => actual.is_some(),
        Operator::NotExists => actual.is_none(),
        Operator::StartsWith => compare_text(present, expected, |a, b| a.starts_with(b)),
        Operator::EndsWith => compare_text(present, expected, |a, b| a.ends_with(b)),
        Operator::Contains => match present {
            Value::Array(items) => items.iter().any(|item| loose_eq(item, expected)),
            _ => compare_text(present, expected, |a, b| a.contains(b)),
        },
        Operator::Regex => matches_pattern(present, expected),
        Operator::Before => compare_instants(present, expected, |a, b| a < b),
        Operator::After => compare_instants(present, expected, |a, b| a > b),
        Operator::DateBetween => instant_range(expected)
            .zip(present.as_instant())
            .map(|((start, end), x)| start <= x && x <= end)
            .unwrap_or(false),
        Operator::Unknown(name) => {
            trace!(operator = %name, "unknown operator evaluates to false");
            false
        }
    }
}

/// Check that `expected` has the shape `operator` requires.
///
/// Returns a human-readable diagnostic for configuration errors such as an
/// unordered `between` pair, an empty `in` set or a pattern that does not compile.
pub fn check_expected(operator: &Operator, expected: &Value) -> Result<(), String> {
    match operator {
        Operator::Unknown(name) => Err(format!("unknown operator '{name}'")),
        Operator::In | Operator::NotIn => value_set(expected).map(|_| ()).ok_or_else(|| {
            format!("'{operator}' expects a non-empty array, got {}", expected.type_name())
        }),
        Operator::Between | Operator::NotBetween => {
            numeric_range(expected).map(|_| ()).ok_or_else(|| {
                format!("'{operator}' expects an ordered numeric pair [low, high], got {expected}")
            })
        }
        Operator::DateBetween => instant_range(expected).map(|_| ()).ok_or_else(|| {
            format!("'{operator}' expects an ordered date pair [start, end], got {expected}")
        }),
        Operator::Before | Operator::After => expected.as_instant().map(|_| ()).ok_or_else(|| {
            format!("'{operator}' expects a date, got {expected}")
        }),
        Operator::Regex => match expected.as_str() {
            Some(pattern) => compile_pattern(pattern).map(|_| ()),
            None => Err(format!("'regex' expects a pattern string, got {}", expected.type_name())),
        },
        Operator::StartsWith | Operator::EndsWith => match expected.as_text() {
            Some(_) => Ok(()),
            None => Err(format!("'{operator}' expects a scalar, got {}", expected.type_name())),
        },
        _ => Ok(()),
    }
}

// ── Equality and numbers ────────────────────────────────────────────

/// Numeric-aware equality: numbers (or numeric strings) compare by value,
/// dates by instant, everything else structurally or by text form.
pub(crate) fn loose_eq(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (a.as_number(), b.as_number()) {
        return x == y;
    }
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Date(_), _) | (_, Value::Date(_)) => match (a.as_instant(), b.as_instant()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| loose_eq(x, y))
        }
        (Value::Map(_), _) | (_, Value::Map(_)) => a == b,
        (Value::Array(_), _) | (_, Value::Array(_)) => false,
        _ => match (a.as_text(), b.as_text()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

fn compare_numbers(actual: &Value, expected: &Value, cmp: fn(f64, f64) -> bool) -> bool {
    match (actual.as_number(), expected.as_number()) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

fn numeric_range(expected: &Value) -> Option<(f64, f64)> {
    match expected.as_array()? {
        [low, high] => {
            let (low, high) = (low.as_number()?, high.as_number()?);
            (low <= high).then_some((low, high))
        }
        _ => None,
    }
}

// ── Sets and emptiness ──────────────────────────────────────────────

fn value_set(expected: &Value) -> Option<&[Value]> {
    expected.as_array().filter(|items| !items.is_empty())
}

/// Array subjects are members when any of their elements is.
fn is_member(value: &Value, set: &[Value]) -> bool {
    match value {
        Value::Array(items) => items.iter().any(|item| is_member(item, set)),
        _ => set.iter().any(|candidate| loose_eq(value, candidate)),
    }
}

fn is_empty(actual: Option<&Value>) -> bool {
    match actual {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Number(n)) => *n == 0.0,
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Map(map)) => map.is_empty(),
        Some(Value::Bool(_)) | Some(Value::Date(_)) => false,
    }
}

// ── Strings and patterns ────────────────────────────────────────────

fn compare_text(actual: &Value, expected: &Value, cmp: fn(&str, &str) -> bool) -> bool {
    match (actual.as_text(), expected.as_text()) {
        (Some(a), Some(b)) => cmp(&a, &b),
        _ => false,
    }
}

fn matches_pattern(actual: &Value, expected: &Value) -> bool {
    let (Some(text), Some(pattern)) = (actual.as_text(), expected.as_str()) else {
        return false;
    };
    match compile_pattern(pattern) {
        Ok(regex) => regex.is_match(&text),
        Err(e) => {
            warn!(pattern = %pattern, error = %e, "invalid regex pattern, rule fails closed");
            false
        }
    }
}

/// Compile a pattern through the shared cache.
///
/// Accepts bare patterns and `/pattern/flags` with flags from `imsx`.
pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex, String> {
    let mut cache = PATTERN_CACHE.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(cached) = cache.get(pattern) {
        return cached.clone();
    }
    let compiled = Regex::new(&normalize_pattern(pattern))
        .map_err(|e| format!("invalid regex '{pattern}': {e}"));
    cache.put(pattern.to_string(), compiled.clone());
    compiled
}

/// Translate `/body/flags` into `(?flags)body`; other input passes through.
fn normalize_pattern(pattern: &str) -> String {
    if let Some(rest) = pattern.strip_prefix('/') {
        if let Some(end) = rest.rfind('/') {
            let (body, flags) = (&rest[..end], &rest[end + 1..]);
            if flags.chars().all(|c| "imsxu".contains(c)) {
                let inline: String = flags.chars().filter(|c| *c != 'u').collect();
                return if inline.is_empty() {
                    body.to_string()
                } else {
                    format!("(?{inline}){body}")
                };
            }
        }
    }
    pattern.to_string()
}

// ── Dates ───────────────────────────────────────────────────────────

fn compare_instants(
    actual: &Value,
    expected: &Value,
    cmp: fn(DateTime<Utc>, DateTime<Utc>) -> bool,
) -> bool {
    match (actual.as_instant(), expected.as_instant()) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

fn instant_range(expected: &Value) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    match expected.as_array()? {
        [start, end] => {
            let (start, end) = (start.as_instant()?, end.as_instant()?);
            (start <= end).then_some((start, end))
        }
        _ => None,
    }
}

// ── Tests ───────────────────────────────────────────────────────────
