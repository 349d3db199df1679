//! Settings validation
//!
//! Rules:
//! - field ranges declared on the settings types (`batch_size`, `sink.timeout_secs`)
//! - index name accepted by the bulk API
//! - a password needs a username

use ::validator::{Validate, ValidationErrors, ValidationErrorsKind};
use contracts::{ContractError, IngestSettings};

/// Longest index name in bytes
pub const MAX_INDEX_LEN: usize = 255;

const FORBIDDEN_INDEX_CHARS: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|', ',', '#', ' '];

/// Validate settings
///
/// Returns the first error found, or Ok(()).
pub fn validate(settings: &IngestSettings) -> Result<(), ContractError> {
    validate_declared(settings)?;
    validate_index_name(&settings.index)?;
    validate_credentials(settings)?;
    Ok(())
}

/// Range rules from the `Validate` derive
fn validate_declared(settings: &IngestSettings) -> Result<(), ContractError> {
    settings
        .validate()
        .map_err(|errors| ContractError::config_validation(first_field(&errors), errors.to_string()))
}

/// Dotted path of one failing field
fn first_field(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    match fields.first() {
        Some((field, ValidationErrorsKind::Struct(inner))) => {
            format!("{field}.{}", first_field(inner))
        }
        Some((field, _)) => field.to_string(),
        None => "settings".to_string(),
    }
}

/// Check an index name against the bulk API naming rules
pub fn validate_index_name(name: &str) -> Result<(), ContractError> {
    let reject = |message: String| Err(ContractError::config_validation("index", message));

    if name.is_empty() {
        return reject("index name is empty".into());
    }
    if name.len() > MAX_INDEX_LEN {
        return reject(format!(
            "index name is {} bytes, limit is {MAX_INDEX_LEN}",
            name.len()
        ));
    }
    if name == "." || name == ".." {
        return reject(format!("'{name}' is not a valid index name"));
    }
    if name.starts_with(['-', '_', '+']) {
        return reject(format!("index name '{name}' must not start with '-', '_' or '+'"));
    }
    if name.chars().any(char::is_uppercase) {
        return reject(format!("index name '{name}' must be lowercase"));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_INDEX_CHARS.contains(c)) {
        return reject(format!("index name '{name}' contains forbidden character '{c}'"));
    }
    Ok(())
}

fn validate_credentials(settings: &IngestSettings) -> Result<(), ContractError> {
    let sink = &settings.sink;
    if sink.password.is_some() && sink.username.is_none() {
        return Err(ContractError::config_validation(
            "sink.password",
            "a password requires a username",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{IndexName, SinkSettings};

    fn with_index(name: &str) -> IngestSettings {
        IngestSettings {
            index: IndexName::from(name),
            ..Default::default()
        }
    }

    fn field_of(err: ContractError) -> String {
        match err {
            ContractError::ConfigValidation { field, .. } => field,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate(&IngestSettings::default()).is_ok());
    }

    #[test]
    fn test_index_names() {
        for good in ["hostlogs", "win-logs_2024.01", "a", "logs+x"] {
            assert!(validate(&with_index(good)).is_ok(), "{good}");
        }
        let too_long = "a".repeat(MAX_INDEX_LEN + 1);
        for bad in ["", "HostLogs", "-logs", "_logs", "+logs", ".", "..", "a b", "a/b", "a*", "a,b", "a#b", too_long.as_str()] {
            let err = validate(&with_index(bad)).unwrap_err();
            assert_eq!(field_of(err), "index", "{bad}");
        }
    }

    #[test]
    fn test_batch_size_range() {
        let settings = IngestSettings {
            batch_size: 0,
            ..Default::default()
        };
        assert_eq!(field_of(validate(&settings).unwrap_err()), "batch_size");
    }

    #[test]
    fn test_nested_timeout_range() {
        let settings = IngestSettings {
            sink: SinkSettings {
                timeout_secs: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(field_of(validate(&settings).unwrap_err()), "sink.timeout_secs");
    }

    #[test]
    fn test_password_requires_username() {
        let settings = IngestSettings {
            sink: SinkSettings {
                password: Some("changeme".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(field_of(validate(&settings).unwrap_err()), "sink.password");
    }
}
