use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::subject::{CanonicalKey, Subject};

/// Adjective → ordered, duplicate-free list of raw animal names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdjectiveIndex {
    entries: BTreeMap<String, Vec<String>>,
}

impl AdjectiveIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `animal` under `adjective` (lowercased) unless already listed there.
    pub fn insert(&mut self, adjective: &str, animal: impl Into<String>) {
        let animal = animal.into();
        let list = self.entries.entry(adjective.to_lowercase()).or_default();
        if !list.contains(&animal) {
            list.push(animal);
        }
    }

    pub fn get(&self, adjective: &str) -> Option<&[String]> {
        self.entries.get(adjective).map(Vec::as_slice)
    }

    /// Adjectives in sorted order.
    pub fn adjectives(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(adj, animals)| (adj.as_str(), animals.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One subject per distinct canonical key, in first-seen order.
    /// The first raw name seen for a key is its representative.
    ///
    /// Distinct keys can sanitize to the same file name ("ass/donkey" and
    /// "ass donkey"); later subjects get a numeric suffix so that no two
    /// subjects share an image file.
    pub fn unique_subjects(&self) -> Vec<Subject> {
        let mut seen: HashSet<CanonicalKey> = HashSet::new();
        let mut stems: HashSet<String> = HashSet::new();
        let mut subjects = Vec::new();
        for animals in self.entries.values() {
            for raw in animals {
                let subject = Subject::new(raw.as_str());
                if subject.key.is_empty() || !seen.insert(subject.key.clone()) {
                    continue;
                }
                let stem = unique_stem(&subject.file_stem, &mut stems);
                subjects.push(subject.with_file_stem(stem));
            }
        }
        subjects
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

/// Claims `base`, or the first free `{base}_{n}` for n >= 2. Compared
/// case-insensitively so the names stay distinct on case-folding filesystems.
fn unique_stem(base: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(base.to_lowercase()) {
        return base.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}_{n}");
        if taken.insert(candidate.to_lowercase()) {
            return candidate;
        }
        n += 1;
    }
}

impl<A, S> FromIterator<(A, Vec<S>)> for AdjectiveIndex
where
    A: AsRef<str>,
    S: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (A, Vec<S>)>>(iter: I) -> Self {
        let mut index = Self::new();
        for (adjective, animals) in iter {
            for animal in animals {
                index.insert(adjective.as_ref(), animal);
            }
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_insert_is_duplicate_free_and_ordered() {
        let mut index = AdjectiveIndex::new();
        index.insert("Canine", "Dog");
        index.insert("canine", "Wolf");
        index.insert("canine", "Dog");
        assert_eq!(index.get("canine").unwrap(), ["Dog", "Wolf"]);
    }

    #[test]
    fn test_unique_subjects_dedups_across_adjectives() {
        let index: AdjectiveIndex = [
            ("bovine", vec!["Cattle", "Cattle (domestic)"]),
            ("taurine", vec!["Cattle"]),
            ("asinine", vec!["ass/donkey"]),
        ]
        .into_iter()
        .collect();

        let subjects = index.unique_subjects();
        let keys: Vec<&str> = subjects.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["ass/donkey", "Cattle"]);
        assert_eq!(subjects[1].raw, "Cattle");
    }

    #[test]
    fn test_colliding_file_names_get_suffixes() {
        let index: AdjectiveIndex = [
            ("asinine", vec!["ass/donkey", "ass donkey", "Ass donkey"]),
            ("onagrine", vec!["ass_donkey_2", "ass donkey (wild)"]),
        ]
        .into_iter()
        .collect();

        let stems: Vec<String> = index
            .unique_subjects()
            .into_iter()
            .map(|s| s.file_stem)
            .collect();
        assert_eq!(
            stems,
            vec!["ass_donkey", "ass_donkey_2", "Ass_donkey_3", "ass_donkey_2_2"]
        );
    }

    #[test]
    fn test_json_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.json");
        let index: AdjectiveIndex = [("feline", vec!["Cat", "Lion"])].into_iter().collect();
        index.save_json(&path).unwrap();
        assert_eq!(AdjectiveIndex::load_json(&path).unwrap(), index);
    }
}
