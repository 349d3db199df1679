//! IndexName - Cheap-to-clone destination collection name
//!
//! Uses Arc<str> internally: every envelope carries the name, cloning only bumps a ref count.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Index used when nothing else is configured
pub const DEFAULT_INDEX: &str = "hostlogs";

/// Destination collection at the bulk sink.
///
/// Legacy sink schemas expect the same value as the document type, so one
/// `IndexName` is written to both `_index` and `_type` at serialization time.
///
/// # Examples
/// ```
/// use contracts::IndexName;
///
/// let index: IndexName = "winlogs".into();
/// let copy = index.clone();  // O(1) - just increments ref count
/// assert_eq!(index, copy);
/// assert_eq!(index.as_str(), "winlogs");
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct IndexName(Arc<str>);

impl IndexName {
    #[inline]
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for IndexName {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX)
    }
}

impl Deref for IndexName {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for IndexName {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for IndexName {
    #[inline]
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for IndexName {
    #[inline]
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IndexName({:?})", self.0)
    }
}

impl PartialEq<str> for IndexName {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for IndexName {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl Serialize for IndexName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for IndexName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}
