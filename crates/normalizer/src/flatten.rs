//! Payload flattening.
//!
//! Rules are evaluated top-down and the first match wins:
//! 1. no `Event` → the record itself is the document (non-maps are wrapped in `RawData`)
//! 2. `Event` without `EventData` → top-level `RawData` holds the rendered `Event`
//! 3. `EventData` without `Data` → `Event.RawData` replaces `Event.EventData`
//! 4. `Data` is a list → `Data` becomes a `@Name` → `#text` map
//! 5. any other `Data` → `EventData.RawData` replaces `Data`
//!
//! A `Null` field counts as absent.

use contracts::{RecordMap, RecordValue};
use tracing::debug;

use crate::NormalizationError;

pub(crate) const EVENT: &str = "Event";
const EVENT_DATA: &str = "EventData";
const DATA: &str = "Data";
const RAW_DATA: &str = "RawData";
const NAME_ATTR: &str = "@Name";
const TEXT_KEY: &str = "#text";

/// Which flattening rule applies to a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// No `Event` field
    Opaque,
    /// `Event` without `EventData`
    EventOnly,
    /// `EventData` without `Data`
    EventDataWithoutData,
    /// `Data` is a list of named entries
    DataEntries,
    /// `Data` is a single value
    SingleData,
}

impl PayloadShape {
    /// Short label for metrics and structured logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opaque => "opaque",
            Self::EventOnly => "event_only",
            Self::EventDataWithoutData => "event_data_without_data",
            Self::DataEntries => "data_entries",
            Self::SingleData => "single_data",
        }
    }
}

fn present<'a>(map: &'a RecordMap, key: &str) -> Option<&'a RecordValue> {
    map.get(key).filter(|value| !value.is_null())
}

/// Decide which flattening rule applies.
pub fn classify(root: &RecordValue) -> PayloadShape {
    let Some(event) = root.as_map().and_then(|map| present(map, EVENT)) else {
        return PayloadShape::Opaque;
    };
    let Some(event_data) = event.as_map().and_then(|map| present(map, EVENT_DATA)) else {
        return PayloadShape::EventOnly;
    };
    match event_data.as_map().and_then(|map| present(map, DATA)) {
        None => PayloadShape::EventDataWithoutData,
        Some(RecordValue::List(_)) => PayloadShape::DataEntries,
        Some(_) => PayloadShape::SingleData,
    }
}

/// Apply the first matching rule and return the document fields.
pub(crate) fn flatten_payload(root: RecordValue) -> Result<RecordMap, NormalizationError> {
    let shape = classify(&root);

    let mut map = match root {
        RecordValue::Map(map) => map,
        other => {
            let mut wrapper = RecordMap::new();
            wrapper.insert(RAW_DATA, RecordValue::Text(other.to_raw_string()?));
            return Ok(wrapper);
        }
    };

    match shape {
        // Structured payloads are adopted as-is instead of being wrapped.
        PayloadShape::Opaque => {}
        PayloadShape::EventOnly => attach_event_raw_data(&mut map)?,
        PayloadShape::EventDataWithoutData => {
            if let Some(event) = map.get_mut(EVENT).and_then(RecordValue::as_map_mut) {
                replace_event_data_with_raw(event)?;
            }
        }
        PayloadShape::DataEntries => {
            if let Some(event_data) = event_data_mut(&mut map) {
                collapse_data_entries(event_data);
            }
        }
        PayloadShape::SingleData => {
            if let Some(event_data) = event_data_mut(&mut map) {
                replace_data_with_raw(event_data)?;
            }
        }
    }

    Ok(map)
}

fn event_data_mut(map: &mut RecordMap) -> Option<&mut RecordMap> {
    map.get_mut(EVENT)
        .and_then(RecordValue::as_map_mut)
        .and_then(|event| event.get_mut(EVENT_DATA))
        .and_then(RecordValue::as_map_mut)
}

fn attach_event_raw_data(map: &mut RecordMap) -> Result<(), NormalizationError> {
    let Some(event) = map.get_mut(EVENT) else {
        return Ok(());
    };
    if let Some(fields) = event.as_map_mut() {
        fields.remove(EVENT_DATA);
    }
    let raw = event.to_raw_string()?;
    map.insert(RAW_DATA, RecordValue::Text(raw));
    Ok(())
}

fn replace_event_data_with_raw(event: &mut RecordMap) -> Result<(), NormalizationError> {
    if let Some(event_data) = event.remove(EVENT_DATA) {
        event.insert(RAW_DATA, RecordValue::Text(event_data.to_raw_string()?));
    }
    Ok(())
}

fn replace_data_with_raw(event_data: &mut RecordMap) -> Result<(), NormalizationError> {
    if let Some(data) = event_data.remove(DATA) {
        event_data.insert(RAW_DATA, RecordValue::Text(data.to_raw_string()?));
    }
    Ok(())
}

fn collapse_data_entries(event_data: &mut RecordMap) {
    let named = match event_data.get(DATA) {
        Some(RecordValue::List(entries)) => named_entries(entries),
        _ => return,
    };
    event_data.insert(DATA, RecordValue::Map(named));
}

/// `@Name` → `#text` for every entry that has a name; the rest are skipped.
fn named_entries(entries: &[RecordValue]) -> RecordMap {
    let mut named = RecordMap::new();
    for (position, entry) in entries.iter().enumerate() {
        let Some(name) = entry
            .as_map()
            .and_then(|fields| fields.get(NAME_ATTR))
            .and_then(RecordValue::as_text)
        else {
            debug!(position, "Skipping Data entry without @Name");
            continue;
        };
        let text = entry
            .pointer(&[TEXT_KEY])
            .and_then(RecordValue::as_text)
            .unwrap_or_default();
        named.insert(name, RecordValue::Text(text.to_string()));
    }
    named
}
