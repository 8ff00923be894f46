//! Access-token storage keyed by endpoint.
//!
//! Tokens live in `<TETHER_HOME>/tokens.json` with restricted permissions
//! (0600). They are never logged or displayed in full.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config::paths;

/// Token store filename under the tether home.
const TOKEN_FILE: &str = "tokens.json";

/// Durable access-token storage, keyed by endpoint URL.
pub trait SecretStore: Send + Sync {
    /// Returns the stored token for an endpoint, if any.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    fn get(&self, endpoint: &str) -> Result<Option<String>>;

    /// Stores a token for an endpoint, replacing any existing one.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    fn store_token(&self, endpoint: &str, token: &str) -> Result<()>;

    /// Removes the token for an endpoint. Returns whether one existed.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    fn delete_token(&self, endpoint: &str) -> Result<bool>;
}

/// File-backed token store.
#[derive(Debug, Clone)]
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    /// Store at the default location under the tether home.
    pub fn default_location() -> Self {
        Self {
            path: paths::tether_home().join(TOKEN_FILE),
        }
    }

    /// Store at an explicit path.
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    fn load(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read tokens from {}", self.path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse tokens from {}", self.path.display()))
    }

    /// Saves the token map with restricted permissions (0600).
    fn save(&self, tokens: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(tokens).context("Failed to serialize token store")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, contents)
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        Ok(())
    }
}

impl SecretStore for TokenFile {
    fn get(&self, endpoint: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(endpoint))
    }

    fn store_token(&self, endpoint: &str, token: &str) -> Result<()> {
        let mut tokens = self.load()?;
        tokens.insert(endpoint.to_string(), token.to_string());
        self.save(&tokens)
    }

    fn delete_token(&self, endpoint: &str) -> Result<bool> {
        let mut tokens = self.load()?;
        let existed = tokens.remove(endpoint).is_some();
        self.save(&tokens)?;
        Ok(existed)
    }
}

/// Returns a masked version of a token for display (first 12 chars + ...).
pub fn mask_token(token: &str) -> String {
    if token.len() <= 16 {
        return "***".to_string();
    }
    format!("{}...", &token[..12])
}
