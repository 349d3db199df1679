//! Record → document transform.

use contracts::{NormalizedDocument, RawRecord, RecordMap, RecordValue};
use tracing::trace;

use crate::flatten::{classify, flatten_payload, EVENT};
use crate::timestamp::{parse_system_time, to_iso8601};
use crate::NormalizationError;

/// Normalize one record.
///
/// The record is borrowed; the document is built from a private copy.
///
/// # Errors
/// Missing or unparsable timestamp, or a payload that cannot be rendered as `RawData`.
/// Either way the record should be dropped and the run continue.
pub fn normalize(record: &RawRecord) -> Result<NormalizedDocument, NormalizationError> {
    let RecordValue::Map(root) = &record.tree else {
        return Err(NormalizationError::MissingTimestamp);
    };
    let mut root = root.clone();

    let iso = rewrite_system_time(&mut root)?;
    root.insert(
        NormalizedDocument::TIMESTAMP_FIELD,
        RecordValue::Text(iso),
    );

    let tree = RecordValue::Map(root);
    trace!(
        record_id = record.record_id,
        shape = classify(&tree).as_str(),
        "Flattening payload"
    );
    let fields = flatten_payload(tree)?;

    Ok(NormalizedDocument::new(fields.into()))
}

/// `Event` when the record has one, otherwise the record root.
fn body_mut(root: &mut RecordMap) -> Option<&mut RecordMap> {
    let has_event = root.get(EVENT).is_some_and(|event| !event.is_null());
    if has_event {
        root.get_mut(EVENT).and_then(RecordValue::as_map_mut)
    } else {
        Some(root)
    }
}

fn system_time_mut(body: &mut RecordMap) -> Option<&mut RecordValue> {
    body.get_mut("System")
        .and_then(RecordValue::as_map_mut)
        .and_then(|system| system.get_mut("TimeCreated"))
        .and_then(RecordValue::as_map_mut)
        .and_then(|created| created.get_mut("@SystemTime"))
}

/// Parse the timestamp, write the ISO form back in place and return it.
fn rewrite_system_time(root: &mut RecordMap) -> Result<String, NormalizationError> {
    let slot = body_mut(root)
        .and_then(system_time_mut)
        .ok_or(NormalizationError::MissingTimestamp)?;
    let raw = slot.as_text().ok_or(NormalizationError::MissingTimestamp)?;

    let iso = to_iso8601(&parse_system_time(raw)?);
    *slot = RecordValue::Text(iso.clone());
    Ok(iso)
}
