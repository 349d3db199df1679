//! SystemTime parsing and ISO-8601 rendering.

use chrono::{NaiveDateTime, Timelike};

use crate::NormalizationError;

const WHOLE_SECONDS: &str = "%Y-%m-%d %H:%M:%S";
const FRACTIONAL_SECONDS: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Parse a record's `@SystemTime` value.
///
/// The fractional format is used only when the text contains a `.`.
/// A `T` date/time separator and a trailing `Z` are accepted as well.
/// Precision is truncated to microseconds.
pub fn parse_system_time(raw: &str) -> Result<NaiveDateTime, NormalizationError> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix('Z').unwrap_or(trimmed);
    let cleaned = trimmed.replacen('T', " ", 1);

    let format = if cleaned.contains('.') {
        FRACTIONAL_SECONDS
    } else {
        WHOLE_SECONDS
    };

    let parsed = NaiveDateTime::parse_from_str(&cleaned, format).map_err(|source| {
        NormalizationError::MalformedTimestamp {
            value: raw.to_string(),
            source,
        }
    })?;

    let micros_only = parsed.nanosecond() / 1_000 * 1_000;
    Ok(parsed.with_nanosecond(micros_only).unwrap_or(parsed))
}

/// ISO-8601 text; the `.ffffff` part only appears when it is non-zero.
pub fn to_iso8601(time: &NaiveDateTime) -> String {
    if time.nanosecond() == 0 {
        time.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        time.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}
