//! Recent search terms for the terminal client, most recent first.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct SearchHistory {
    path: PathBuf,
    limit: usize,
    terms: Vec<String>,
}

impl SearchHistory {
    /// Loads history from `path`. A missing file is an empty history; an
    /// unreadable one is discarded with a warning.
    pub fn load(path: impl Into<PathBuf>, limit: usize) -> Result<Self> {
        let path = path.into();
        let limit = limit.max(1);

        let terms = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read history file: {}", path.display()))?;
            match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(mut terms) => {
                    terms.truncate(limit);
                    terms
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring corrupt search history");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Ok(Self { path, limit, terms })
    }

    #[must_use]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Moves `term` to the front, dropping the oldest entry past the limit.
    /// Blank terms are ignored.
    pub fn add(&mut self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return false;
        }

        self.terms.retain(|t| t != term);
        self.terms.insert(0, term.to_string());
        self.terms.truncate(self.limit);
        true
    }

    pub fn remove(&mut self, term: &str) -> bool {
        let before = self.terms.len();
        self.terms.retain(|t| t != term);
        self.terms.len() != before
    }

    pub fn clear(&mut self) {
        self.terms.clear();
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.terms)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write history file: {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn history(dir: &TempDir, limit: usize) -> SearchHistory {
        SearchHistory::load(dir.path().join("history.json"), limit).unwrap()
    }

    #[test]
    fn test_most_recent_first_without_duplicates() {
        let dir = TempDir::new().unwrap();
        let mut h = history(&dir, 10);

        h.add("batman");
        h.add("dune");
        h.add("batman");

        assert_eq!(h.terms(), ["batman", "dune"]);
    }

    #[test]
    fn test_blank_terms_ignored() {
        let dir = TempDir::new().unwrap();
        let mut h = history(&dir, 10);

        assert!(!h.add("   "));
        assert!(h.terms().is_empty());
    }

    #[test]
    fn test_capped_at_limit() {
        let dir = TempDir::new().unwrap();
        let mut h = history(&dir, 3);

        for term in ["a", "b", "c", "d"] {
            h.add(term);
        }

        assert_eq!(h.terms(), ["d", "c", "b"]);
    }

    #[test]
    fn test_remove_and_clear() {
        let dir = TempDir::new().unwrap();
        let mut h = history(&dir, 10);
        h.add("alien");
        h.add("heat");

        assert!(h.remove("alien"));
        assert!(!h.remove("alien"));
        assert_eq!(h.terms(), ["heat"]);

        h.clear();
        assert!(h.terms().is_empty());
    }

    #[test]
    fn test_persists_across_loads() {
        let dir = TempDir::new().unwrap();
        let mut h = history(&dir, 10);
        h.add("memento");
        h.add("inception");
        h.save().unwrap();

        let reloaded = history(&dir, 10);
        assert_eq!(reloaded.terms(), ["inception", "memento"]);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("history.json"), "{not json").unwrap();

        assert!(history(&dir, 10).terms().is_empty());
    }
}
