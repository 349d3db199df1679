//! RawRecord - Record source output
//!
//! A record is an ordered tree mirroring the markup document it was parsed from:
//! attributes are `@name` keys, element text is `#text`, repeated child elements
//! collapse into a list.

use serde::{Serialize, Serializer};

/// One node of a record tree
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RecordValue {
    /// Element without attributes, children or text
    #[default]
    Null,
    /// Plain text (attribute value or text-only element)
    Text(String),
    /// Element with attributes and/or children
    Map(RecordMap),
    /// Repeated sibling elements, in document order
    List(Vec<RecordValue>),
}

impl RecordValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&RecordMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut RecordMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Follow a chain of map keys.
    ///
    /// Returns `None` as soon as a step is missing or is not a map.
    pub fn pointer(&self, path: &[&str]) -> Option<&RecordValue> {
        path.iter()
            .try_fold(self, |node, key| node.as_map().and_then(|map| map.get(key)))
    }

    /// Mutable variant of [`RecordValue::pointer`].
    pub fn pointer_mut(&mut self, path: &[&str]) -> Option<&mut RecordValue> {
        path.iter().try_fold(self, |node, key| {
            node.as_map_mut().and_then(|map| map.get_mut(key))
        })
    }

    /// Raw string rendering used for `RawData` fallbacks.
    ///
    /// Text is used verbatim, every other shape is rendered as compact JSON.
    pub fn to_raw_string(&self) -> Result<String, serde_json::Error> {
        match self {
            Self::Text(text) => Ok(text.clone()),
            other => serde_json::to_string(other),
        }
    }
}

impl Serialize for RecordValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Text(text) => serializer.serialize_str(text),
            Self::Map(map) => map.serialize(serializer),
            Self::List(items) => serializer.collect_seq(items),
        }
    }
}

impl From<&str> for RecordValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for RecordValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<RecordMap> for RecordValue {
    fn from(map: RecordMap) -> Self {
        Self::Map(map)
    }
}

/// Scalars other than strings are kept as their JSON text, the tree only knows text leaves.
impl From<serde_json::Value> for RecordValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Null,
            Value::String(text) => Self::Text(text),
            Value::Bool(flag) => Self::Text(flag.to_string()),
            Value::Number(number) => Self::Text(number.to_string()),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

/// Canonical JSON form: only JSON-native types remain.
impl From<RecordValue> for serde_json::Value {
    fn from(value: RecordValue) -> Self {
        match value {
            RecordValue::Null => Self::Null,
            RecordValue::Text(text) => Self::String(text),
            RecordValue::Map(map) => Self::Object(map.into()),
            RecordValue::List(items) => Self::Array(items.into_iter().map(Self::from).collect()),
        }
    }
}

/// Insertion-ordered map of a record element's fields
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordMap {
    entries: Vec<(String, RecordValue)>,
}

impl RecordMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    pub fn get(&self, key: &str) -> Option<&RecordValue> {
        self.position(key).map(|idx| &self.entries[idx].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut RecordValue> {
        self.position(key).map(move |idx| &mut self.entries[idx].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Insert a field. An existing key keeps its position and gets the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: RecordValue) -> Option<RecordValue> {
        let key = key.into();
        match self.position(&key) {
            Some(idx) => Some(std::mem::replace(&mut self.entries[idx].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Remove a field, keeping the order of the remaining ones.
    pub fn remove(&mut self, key: &str) -> Option<RecordValue> {
        self.position(key).map(|idx| self.entries.remove(idx).1)
    }

    /// Add a child element; a repeated key collapses into a list in arrival order.
    pub fn append_child(&mut self, key: impl Into<String>, value: RecordValue) {
        let key = key.into();
        let Some(idx) = self.position(&key) else {
            self.entries.push((key, value));
            return;
        };
        match &mut self.entries[idx].1 {
            RecordValue::List(items) => items.push(value),
            existing => {
                let first = std::mem::take(existing);
                *existing = RecordValue::List(vec![first, value]);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RecordValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl Serialize for RecordMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl FromIterator<(String, RecordValue)> for RecordMap {
    fn from_iter<I: IntoIterator<Item = (String, RecordValue)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl IntoIterator for RecordMap {
    type Item = (String, RecordValue);
    type IntoIter = std::vec::IntoIter<(String, RecordValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl From<RecordMap> for serde_json::Map<String, serde_json::Value> {
    fn from(map: RecordMap) -> Self {
        map.into_iter()
            .map(|(key, value)| (key, serde_json::Value::from(value)))
            .collect()
    }
}

/// One record as produced by a [`RecordSource`](crate::RecordSource)
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Identifier assigned by the container (used for diagnostics)
    pub record_id: u64,
    /// Parsed record tree, normally a map with a single `Event` key
    pub tree: RecordValue,
}

impl RawRecord {
    pub fn new(record_id: u64, tree: impl Into<RecordValue>) -> Self {
        Self {
            record_id,
            tree: tree.into(),
        }
    }

    /// Build a record from a JSON fixture (tests and in-memory sources).
    pub fn from_json(record_id: u64, value: serde_json::Value) -> Self {
        Self::new(record_id, RecordValue::from(value))
    }
}
