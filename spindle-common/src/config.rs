//! User configuration loading and saving
//!
//! Holds the optional Discogs access token used by the fallback lookup
//! provider. Stored as a user-scoped JSON file; an absent file means the
//! fallback provider stays disabled. The loaded value is passed explicitly
//! into each session rather than held in process-wide state.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const CONFIG_FILE_NAME: &str = "spindle.json";

/// User configuration persisted between runs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Discogs personal access token (fallback lookup provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discogs_token: Option<String>,
}

impl Config {
    /// Default configuration file path for the platform
    ///
    /// Resolves to `<user config dir>/spindle/spindle.json`, e.g.
    /// `~/.config/spindle/spindle.json` on Linux.
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join("spindle").join(CONFIG_FILE_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Load configuration from `path`
    ///
    /// An absent file is not an error; it yields the default configuration
    /// (no token, fallback disabled). A present but unparseable file is
    /// reported so the user knows the token was not picked up.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)
            .map_err(|e| Error::Config(format!("Could not parse {}: {}", path.display(), e)))?;

        tracing::debug!(
            path = %path.display(),
            has_token = config.discogs_token.is_some(),
            "Loaded configuration"
        );

        Ok(config)
    }

    /// Save configuration to `path`, creating parent directories as needed
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Internal(format!("Could not serialize config: {}", e)))?;
        std::fs::write(path, contents)?;

        tracing::debug!(path = %path.display(), "Saved configuration");

        Ok(())
    }
}
