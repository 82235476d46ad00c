use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::value::Value;

/// The record an evaluation runs against: field path → value.
///
/// Keys are kept sorted so that serialization is canonical and can feed
/// cache keys directly. The engine only reads subjects, never mutates them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subject {
    fields: BTreeMap<String, Value>,
}

impl Subject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and adapters.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Parse a subject from a JSON object.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| CoreError::Serialize(e.to_string()))?;
        Self::try_from(value)
    }

    /// Resolve a dotted field path.
    ///
    /// A literal key containing dots wins over traversal. Otherwise each
    /// segment descends into a map by key or into an array by numeric index.
    /// Returns `None` when the path is absent; a present `null` is `Some(Null)`.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.fields.get(path) {
            return Some(value);
        }

        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.fields.get(first)?;
        for segment in segments {
            current = match current {
                Value::Map(map) => map.get(segment)?,
                Value::Array(items) => {
                    let idx: usize = segment.parse().ok()?;
                    items.get(idx)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Key-sorted JSON rendering. Identical subjects always render identically.
    pub fn canonical_json(&self) -> String {
        let json: serde_json::Value = Value::Map(self.fields.clone()).into();
        json.to_string()
    }
}

impl TryFrom<serde_json::Value> for Subject {
    type Error = CoreError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match Value::from(value) {
            Value::Map(fields) => Ok(Self { fields }),
            other => Err(CoreError::InvalidSubject(format!(
                "expected a JSON object, got {}",
                other.type_name()
            ))),
        }
    }
}

impl From<BTreeMap<String, Value>> for Subject {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }
}

impl FromIterator<(String, Value)> for Subject {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
