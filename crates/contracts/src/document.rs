//! NormalizedDocument / DispatchEnvelope - Normalizer output and bulk sink input

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::sync::Arc;

use crate::{ContractError, IndexName};

/// JSON object with stable key order
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Flat, search-engine friendly document built from one record.
///
/// Holds only JSON-native values; produced fresh per record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedDocument(JsonMap);

impl NormalizedDocument {
    /// Top-level field holding the ISO-8601 event time
    pub const TIMESTAMP_FIELD: &'static str = "@timestamp";

    pub fn new(fields: JsonMap) -> Self {
        Self(fields)
    }

    pub fn as_map(&self) -> &JsonMap {
        &self.0
    }

    pub fn into_map(self) -> JsonMap {
        self.0
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.get(Self::TIMESTAMP_FIELD).and_then(|v| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compact single-line JSON
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }
}

impl From<JsonMap> for NormalizedDocument {
    fn from(fields: JsonMap) -> Self {
        Self(fields)
    }
}

/// Caller-supplied metadata attached to every dispatched document.
///
/// Immutable and shared; the default is a fresh empty object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metadata(Arc<JsonMap>);

impl Metadata {
    pub fn new(fields: JsonMap) -> Self {
        Self(Arc::new(fields))
    }

    /// Parse a JSON object (e.g. from the command line).
    ///
    /// # Errors
    /// Invalid JSON, or JSON that is not an object.
    pub fn parse(text: &str) -> Result<Self, ContractError> {
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(serde_json::Value::Object(fields)) => Ok(Self::new(fields)),
            Ok(other) => Err(ContractError::InvalidMetadata {
                message: format!("expected a JSON object, got {other}"),
            }),
            Err(e) => Err(ContractError::InvalidMetadata {
                message: e.to_string(),
            }),
        }
    }

    pub fn as_map(&self) -> &JsonMap {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Metadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Metadata {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        JsonMap::deserialize(deserializer).map(Self::new)
    }
}

/// A document tagged with its destination, ready for a bulk submission.
///
/// Created at enqueue time and never modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchEnvelope {
    document: NormalizedDocument,
    index: IndexName,
    metadata: Metadata,
}

#[derive(Serialize)]
struct BulkAction<'a> {
    index: BulkTarget<'a>,
}

#[derive(Serialize)]
struct BulkTarget<'a> {
    #[serde(rename = "_index")]
    index: &'a str,
    #[serde(rename = "_type")]
    doc_type: &'a str,
}

/// Document fields followed by the metadata under [`DispatchEnvelope::META_FIELD`]
struct BulkSource<'a>(&'a DispatchEnvelope);

impl Serialize for BulkSource<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let envelope = self.0;
        let fields = envelope.document.as_map();
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in fields
            .iter()
            .filter(|(key, _)| key.as_str() != DispatchEnvelope::META_FIELD)
        {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry(DispatchEnvelope::META_FIELD, &envelope.metadata)?;
        map.end()
    }
}

impl DispatchEnvelope {
    /// Source field carrying the caller metadata
    pub const META_FIELD: &'static str = "meta";

    pub fn new(document: NormalizedDocument, index: IndexName, metadata: Metadata) -> Self {
        Self {
            document,
            index,
            metadata,
        }
    }

    pub fn document(&self) -> &NormalizedDocument {
        &self.document
    }

    pub fn index(&self) -> &IndexName {
        &self.index
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Append the action line and the source line (NDJSON) for a bulk request.
    pub fn write_bulk_lines(&self, out: &mut Vec<u8>) -> Result<(), serde_json::Error> {
        let action = BulkAction {
            index: BulkTarget {
                index: self.index.as_str(),
                doc_type: self.index.as_str(),
            },
        };
        serde_json::to_writer(&mut *out, &action)?;
        out.push(b'\n');
        serde_json::to_writer(&mut *out, &BulkSource(self))?;
        out.push(b'\n');
        Ok(())
    }
}
