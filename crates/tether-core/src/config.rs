//! Configuration management for tether.
//!
//! Loads configuration from ${TETHER_HOME}/config.toml with sensible defaults.

use std::collections::HashMap;
use std::fs;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::endpoint::DOTCOM_URL;

/// Main configuration structure.
///
/// Access tokens never live here; they are kept in the secret store keyed by
/// endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Endpoint to authenticate against when none is given explicitly.
    pub endpoint: String,

    /// Extra headers attached to every probe request (e.g. proxy auth).
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub custom_headers: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DOTCOM_URL.to_string(),
            custom_headers: HashMap::new(),
        }
    }
}

impl Config {
    /// Loads the config from the default path, using defaults if absent.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let path = paths::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Writes the config to the default path, creating directories as needed.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub fn save(&self) -> Result<()> {
        let path = paths::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write to {}", path.display()))
    }
}

pub mod paths {
    //! Path resolution for tether configuration and data directories.
    //!
    //! TETHER_HOME resolution order:
    //! 1. TETHER_HOME environment variable (if set)
    //! 2. ~/.config/tether (default)

    use std::path::PathBuf;

    /// Returns the tether home directory.
    ///
    /// Checks TETHER_HOME env var first, falls back to ~/.config/tether
    pub fn tether_home() -> PathBuf {
        if let Ok(home) = std::env::var("TETHER_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("tether"))
            .expect("Could not determine home directory")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        tether_home().join("config.toml")
    }

    /// Returns the directory CLI log files are written to.
    pub fn logs_dir() -> PathBuf {
        tether_home().join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: defaults point at the public instance with no extra headers.
    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.endpoint, DOTCOM_URL);
        assert!(config.custom_headers.is_empty());
    }

    /// Test: partial config files fill in the missing fields.
    #[test]
    fn test_config_partial_parse() {
        let config: Config = toml::from_str("endpoint = \"https://code.example.com/\"").unwrap();
        assert_eq!(config.endpoint, "https://code.example.com/");
        assert!(config.custom_headers.is_empty());

        let config: Config = toml::from_str(
            "endpoint = \"https://code.example.com/\"\n\n[custom_headers]\n\"X-Forwarded-For\" = \"proxy\"\n",
        )
        .unwrap();
        assert_eq!(
            config.custom_headers.get("X-Forwarded-For").map(String::as_str),
            Some("proxy")
        );
    }
}
