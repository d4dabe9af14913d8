use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::subject::CanonicalKey;

/// Canonical key → local image path, or `None` when resolution failed.
///
/// Each key is written once by the orchestrator and never overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultMap {
    records: BTreeMap<CanonicalKey, Option<PathBuf>>,
}

impl ResultMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome for `key`. Returns `false` (and keeps the first
    /// record) if the key was already written.
    pub fn record(&mut self, key: CanonicalKey, image: Option<PathBuf>) -> bool {
        if self.records.contains_key(&key) {
            return false;
        }
        self.records.insert(key, image);
        true
    }

    /// Image path for `key`, if one was resolved.
    pub fn image_for(&self, key: &CanonicalKey) -> Option<&Path> {
        self.records.get(key).and_then(|p| p.as_deref())
    }

    pub fn contains(&self, key: &CanonicalKey) -> bool {
        self.records.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CanonicalKey, Option<&Path>)> {
        self.records.iter().map(|(k, v)| (k, v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.records.values().filter(|v| v.is_some()).count()
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
