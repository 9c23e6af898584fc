//! Metadata for prims and attributes.
//!
//! Metadata is stored as key-value pairs of strings. The edit policy reads
//! the [`MetaData::LOCK_KEY`] entry to veto writes to locked attributes.

use smallvec::SmallVec;
use std::fmt;

/// Metadata storage - key-value pairs of strings.
///
/// Uses SmallVec optimization for common case of few entries.
#[derive(Clone, Default, PartialEq)]
pub struct MetaData {
    entries: SmallVec<[(String, String); 4]>,
}

impl MetaData {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a metadata value, replacing any previous value for `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        if let Some((_, v)) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            *v = value;
            return;
        }
        self.entries.push((key, value));
    }

    /// Get a metadata value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Remove a key and return its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over key-value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    // === Common metadata keys ===

    /// Lock key; the value "true" marks the owner as not editable.
    pub const LOCK_KEY: &'static str = "lock";

    /// Check the lock flag.
    pub fn is_locked(&self) -> bool {
        self.get(Self::LOCK_KEY) == Some("true")
    }

    /// Set or clear the lock flag.
    pub fn set_locked(&mut self, locked: bool) {
        if locked {
            self.set(Self::LOCK_KEY, "true");
        } else {
            self.remove(Self::LOCK_KEY);
        }
    }
}

impl fmt::Debug for MetaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl FromIterator<(String, String)> for MetaData {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut meta = Self::new();
        for (k, v) in iter {
            meta.set(k, v);
        }
        meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_basic() {
        let mut meta = MetaData::new();
        meta.set("key1", "value1");
        meta.set("key2", "value2");

        assert_eq!(meta.get("key1"), Some("value1"));
        assert_eq!(meta.get("key3"), None);
        assert_eq!(meta.len(), 2);

        meta.set("key1", "other");
        assert_eq!(meta.get("key1"), Some("other"));
        assert_eq!(meta.len(), 2);
    }

    #[test]
    fn test_metadata_lock() {
        let mut meta = MetaData::new();
        assert!(!meta.is_locked());

        meta.set_locked(true);
        assert!(meta.is_locked());
        assert_eq!(meta.get(MetaData::LOCK_KEY), Some("true"));

        meta.set_locked(false);
        assert!(!meta.is_locked());
        assert!(meta.is_empty());
    }
}
