use std::fmt;

use serde::{Deserialize, Serialize};

use crate::normalize::{normalize_name, sanitize_filename};

/// Deduplication key derived from a subject's normalized name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    pub fn from_raw(raw: &str) -> Self {
        Self(normalize_name(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One animal name entry to be resolved to an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub raw: String,
    pub key: CanonicalKey,
    /// Image file name without extension. Unique among the subjects of one
    /// run once assigned by `AdjectiveIndex::unique_subjects`.
    pub file_stem: String,
}

impl Subject {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let key = CanonicalKey::from_raw(&raw);
        let file_stem = sanitize_filename(&raw);
        Self { raw, key, file_stem }
    }

    pub fn with_file_stem(mut self, file_stem: impl Into<String>) -> Self {
        self.file_stem = file_stem.into();
        self
    }

    /// The cleaned name used for the first lookup attempt.
    pub fn normalized(&self) -> &str {
        self.key.as_str()
    }

    /// Slash-separated alternates of the raw name ("ass/donkey"), trimmed.
    /// Empty when the raw name has no separator.
    pub fn alternates(&self) -> Vec<&str> {
        if !self.raw.contains('/') {
            return Vec::new();
        }
        self.raw
            .split('/')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_pure_function_of_raw() {
        assert_eq!(
            Subject::new("Cattle").key,
            Subject::new("Cattle (domestic)").key
        );
        assert_eq!(Subject::new("Cattle[4]").key.as_str(), "Cattle");
    }

    #[test]
    fn test_file_stem_is_sanitized_raw_name() {
        assert_eq!(Subject::new("ass/donkey").file_stem, "ass_donkey");
        assert_eq!(Subject::new("Red fox").file_stem, "Red_fox");
    }

    #[test]
    fn test_alternates() {
        let s = Subject::new("ass / donkey");
        assert_eq!(s.alternates(), vec!["ass", "donkey"]);
        assert!(Subject::new("Lion").alternates().is_empty());
    }
}
