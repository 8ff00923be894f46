//! Endpoint history persistence.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config::paths;

/// History filename under the tether home.
const HISTORY_FILE: &str = "endpoints.json";

/// Ordered record of endpoints that have had credentials stored.
pub trait HistoryStore: Send + Sync {
    /// Returns previously saved endpoints, oldest first.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    fn endpoint_history(&self) -> Result<Vec<String>>;

    /// Appends an endpoint to the history.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    fn save_endpoint(&self, endpoint: &str) -> Result<()>;
}

/// File-backed endpoint history.
///
/// Entries are stored exactly as saved: insertion-ordered, no dedup, no cap.
#[derive(Debug, Clone)]
pub struct HistoryFile {
    path: PathBuf,
}

impl HistoryFile {
    /// History at the default location under the tether home.
    pub fn default_location() -> Self {
        Self {
            path: paths::tether_home().join(HISTORY_FILE),
        }
    }

    /// History at an explicit path.
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    fn load(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read history from {}", self.path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse history from {}", self.path.display()))
    }

    fn save(&self, entries: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(entries).context("Failed to serialize history")?;
        fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write to {}", self.path.display()))
    }
}

impl HistoryStore for HistoryFile {
    fn endpoint_history(&self) -> Result<Vec<String>> {
        self.load()
    }

    fn save_endpoint(&self, endpoint: &str) -> Result<()> {
        let mut entries = self.load()?;
        entries.push(endpoint.to_string());
        self.save(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: history preserves insertion order and repeated saves.
    #[test]
    fn test_history_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryFile::at(dir.path().join(HISTORY_FILE));

        assert!(store.endpoint_history().unwrap().is_empty());

        store.save_endpoint("https://a.example.com/").unwrap();
        store.save_endpoint("https://b.example.com/").unwrap();
        store.save_endpoint("https://a.example.com/").unwrap();

        assert_eq!(
            store.endpoint_history().unwrap(),
            vec![
                "https://a.example.com/".to_string(),
                "https://b.example.com/".to_string(),
                "https://a.example.com/".to_string(),
            ]
        );
    }
}
