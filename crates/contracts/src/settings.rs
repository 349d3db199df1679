//! IngestSettings - Config Loader output
//!
//! Everything about where documents go and how they are grouped.

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::{IndexName, Metadata};

/// Default number of documents per bulk submission
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Default sink request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Run settings (file values, then command-line overrides)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct IngestSettings {
    /// Destination collection (also written as the legacy document type)
    pub index: IndexName,

    /// Bulk queue threshold
    #[validate(range(min = 1))]
    pub batch_size: usize,

    /// Metadata attached to every document under `meta`
    pub metadata: Metadata,

    /// Bulk sink connection settings
    #[validate(nested)]
    pub sink: SinkSettings,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            index: IndexName::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            metadata: Metadata::default(),
            sink: SinkSettings::default(),
        }
    }
}

/// Bulk sink connection settings
#[derive(Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SinkSettings {
    /// Per-request timeout in seconds
    #[validate(range(min = 1))]
    pub timeout_secs: u64,

    /// Basic auth user
    pub username: Option<String>,

    /// Basic auth password
    pub password: Option<String>,
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            username: None,
            password: None,
        }
    }
}

impl fmt::Debug for SinkSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkSettings")
            .field("timeout_secs", &self.timeout_secs)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
