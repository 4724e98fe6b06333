use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;

use crate::parser::links;

/// Durable set of already-notified posting keys, persisted as a sorted
/// JSON list so successive saves are byte-for-byte deterministic.
pub struct NotifiedStore {
    path: PathBuf,
}

impl NotifiedStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the persisted set. Missing or corrupt state loads as empty:
    /// an occasional re-notification is preferred over a wedged run.
    /// Stored keys are re-normalized so membership checks match the keys
    /// computed from the current document.
    pub fn load(&self) -> HashSet<String> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(_) => return HashSet::new(),
        };
        match serde_json::from_str::<Vec<String>>(&data) {
            Ok(keys) => keys.iter().map(|key| links::normalize(key)).collect(),
            Err(e) => {
                warn!("Ignoring corrupt notified store {}: {}", self.path.display(), e);
                HashSet::new()
            }
        }
    }

    /// Write the full set, normalized and sorted.
    pub fn save(&self, notified: &HashSet<String>) -> Result<()> {
        let mut keys: Vec<String> = notified.iter().map(|key| links::normalize(key)).collect();
        keys.sort();
        let json = serde_json::to_string_pretty(&keys).context("serializing notified store")?;
        fs::write(&self.path, json)
            .with_context(|| format!("writing notified store {}", self.path.display()))?;
        Ok(())
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, NotifiedStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = NotifiedStore::new(dir.path().join("notified.json"));
        (dir, store)
    }

    #[test]
    fn round_trip_preserves_the_set() {
        let (_dir, store) = temp_store();
        let keys: HashSet<String> = [
            "https://a.example/1".to_string(),
            "Acme|SWE Intern|Toronto, Canada".to_string(),
        ]
        .into_iter()
        .collect();
        store.save(&keys).unwrap();
        assert_eq!(store.load(), keys);
    }

    #[test]
    fn missing_store_loads_empty() {
        let (_dir, store) = temp_store();
        assert!(store.load().is_empty());
    }

    #[test]
    fn corrupt_store_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notified.json");
        fs::write(&path, "{not json").unwrap();
        assert!(NotifiedStore::new(&path).load().is_empty());
    }

    #[test]
    fn saves_are_deterministic_and_sorted() {
        let (_dir, store) = temp_store();
        let keys: HashSet<String> = ["z".to_string(), "a".to_string(), "m".to_string()]
            .into_iter()
            .collect();
        store.save(&keys).unwrap();
        let first = fs::read_to_string(&store.path).unwrap();
        store.save(&keys).unwrap();
        let second = fs::read_to_string(&store.path).unwrap();
        assert_eq!(first, second);

        let parsed: Vec<String> = serde_json::from_str(&first).unwrap();
        assert_eq!(parsed, vec!["a", "m", "z"]);
    }

    #[test]
    fn load_normalizes_stored_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notified.json");
        fs::write(&path, r#"[" https://a.example/x?y=1&amp;z=2 "]"#).unwrap();
        let loaded = NotifiedStore::new(&path).load();
        assert!(loaded.contains("https://a.example/x?y=1&z=2"));
    }
}
