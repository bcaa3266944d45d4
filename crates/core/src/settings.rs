//! User settings persistence.
//!
//! Settings are stored as JSON in the user's config directory
//! (e.g., `~/.config/snaptex/settings.json` on Linux) and double as a
//! [`ConfigSource`] layer sitting above the environment.

use crate::config::{ConfigSource, API_KEY, DEFAULT_MODEL, MODEL};
use crate::error::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// User-configurable settings persisted between sessions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// API key for the remote model. Empty means "not set here".
    #[serde(default)]
    pub api_key: String,
    /// Remote model identifier.
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Settings {
    /// Returns the path to the settings file, creating its directory if needed.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "snaptex", "snaptex").map(|dirs| {
            let config_dir = dirs.config_dir();
            if !config_dir.exists() {
                let _ = fs::create_dir_all(config_dir);
            }
            config_dir.join("settings.json")
        })
    }

    /// Loads settings from disk, falling back to defaults if missing or unreadable.
    pub fn load() -> Self {
        Self::config_path()
            .and_then(|path| fs::read_to_string(&path).ok())
            .and_then(|content| match serde_json::from_str(&content) {
                Ok(settings) => Some(settings),
                Err(e) => {
                    log::warn!("Ignoring malformed settings file: {}", e);
                    None
                }
            })
            .unwrap_or_default()
    }

    /// Persists settings to disk.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            let json = serde_json::to_string_pretty(self)?;
            fs::write(&path, json)?;
            log::info!("Saved settings to {}", path.display());
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
        }
    }
}

impl ConfigSource for Settings {
    fn get(&self, key: &str) -> Option<String> {
        match key {
            API_KEY => Some(self.api_key.clone()),
            // The default model defers to lower layers such as GEMINI_MODEL.
            MODEL => (self.model != DEFAULT_MODEL).then(|| self.model.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.get(MODEL), None);
    }

    #[test]
    fn exposes_api_key_through_config_source() {
        let settings = Settings {
            api_key: "k".into(),
            model: "gemini-2.5-pro".into(),
        };
        assert_eq!(settings.get(API_KEY).as_deref(), Some("k"));
        assert_eq!(settings.get(MODEL).as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(settings.get("other"), None);
    }
}
