//! # Config Loader
//!
//! Settings file loading and validation.
//!
//! Responsibilities:
//! - Parse TOML/JSON settings files
//! - Validate settings (ranges, index name, credentials)
//! - Produce `IngestSettings`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let settings = ConfigLoader::load_from_path(Path::new("evtx2es.toml")).unwrap();
//! println!("Index: {}", settings.index);
//! ```

mod parser;
mod validator;

pub use contracts::IngestSettings;
pub use self::parser::ConfigFormat;
pub use self::validator::{validate, validate_index_name, MAX_INDEX_LEN};

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load settings from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load settings from a file path
    ///
    /// Detects the format from the file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<IngestSettings, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load settings from a string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<IngestSettings, ContractError> {
        let settings = parser::parse(content, format)?;
        validator::validate(&settings)?;
        Ok(settings)
    }

    /// Serialize settings to a TOML string
    pub fn to_toml(settings: &IngestSettings) -> Result<String, ContractError> {
        toml::to_string_pretty(settings)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize settings to a JSON string
    pub fn to_json(settings: &IngestSettings) -> Result<String, ContractError> {
        serde_json::to_string_pretty(settings)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_TOML: &str = r#"
index = "winlogs"
batch_size = 250

[metadata]
case = "IR-2291"

[sink]
timeout_secs = 10
username = "elastic"
password = "changeme"
"#;

    #[test]
    fn test_load_from_path_detects_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evtx2es.toml");
        std::fs::write(&path, SAMPLE_TOML).unwrap();

        let settings = ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(settings.index, "winlogs");
        assert_eq!(settings.batch_size, 250);
    }

    #[test]
    fn test_load_from_path_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evtx2es.yaml");
        std::fs::write(&path, "index: x").unwrap();

        let err = ConfigLoader::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let err = ConfigLoader::load_from_path(Path::new("/nonexistent/evtx2es.toml")).unwrap_err();
        assert!(matches!(err, ContractError::Io(_)));
    }

    #[test]
    fn test_round_trip_toml() {
        let settings = ConfigLoader::load_from_str(SAMPLE_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&settings).unwrap();
        let again = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(settings, again);
    }

    #[test]
    fn test_round_trip_json() {
        let settings = ConfigLoader::load_from_str(SAMPLE_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&settings).unwrap();
        let again = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(settings, again);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let result = ConfigLoader::load_from_str(r#"index = "HostLogs""#, ConfigFormat::Toml);
        assert!(result.unwrap_err().to_string().contains("lowercase"));
    }
}
