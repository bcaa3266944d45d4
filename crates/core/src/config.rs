//! Configuration lookup.
//!
//! The core only ever asks for values by key through [`ConfigSource`]. Where
//! the values come from (environment, the persisted settings file, command
//! line overrides) is decided by whoever builds the source.

use crate::error::{AppError, Result};
use std::collections::HashMap;
use std::env;

/// Key holding the remote model API key.
pub const API_KEY: &str = "api_key";
/// Key holding the remote model identifier.
pub const MODEL: &str = "model";
/// Model used when no source names one.
pub const DEFAULT_MODEL: &str = "gemini-flash-latest";

/// A synchronous key-value view over configuration.
pub trait ConfigSource {
    fn get(&self, key: &str) -> Option<String>;
}

impl ConfigSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Reads configuration from the process environment.
///
/// `api_key` maps to `GEMINI_API_KEY` and `model` to `GEMINI_MODEL`.
/// Call [`crate::init`] first so a `.env` file is picked up.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvConfig;

impl ConfigSource for EnvConfig {
    fn get(&self, key: &str) -> Option<String> {
        let var = match key {
            API_KEY => "GEMINI_API_KEY",
            MODEL => "GEMINI_MODEL",
            _ => return None,
        };
        env::var(var).ok()
    }
}

/// Stacks several sources; the first non-blank value wins.
#[derive(Default)]
pub struct LayeredConfig {
    layers: Vec<Box<dyn ConfigSource + Send + Sync>>,
}

impl LayeredConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a layer below the ones already present.
    pub fn with_layer(mut self, source: impl ConfigSource + Send + Sync + 'static) -> Self {
        self.layers.push(Box::new(source));
        self
    }
}

impl ConfigSource for LayeredConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.layers
            .iter()
            .filter_map(|layer| layer.get(key))
            .find(|value| !value.trim().is_empty())
    }
}

/// Resolved settings needed to talk to the remote model.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_key: String,
    pub model_name: String,
}

impl Config {
    /// Resolves a complete configuration from `source`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Configuration`] when no non-blank API key is set.
    pub fn from_source(source: &dyn ConfigSource) -> Result<Self> {
        let api_key = source
            .get(API_KEY)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                AppError::config("API key is not set; save one in the toolbar or export GEMINI_API_KEY")
            })?;

        let model_name = source
            .get(MODEL)
            .map(|model| model.trim().to_string())
            .filter(|model| !model.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self { api_key, model_name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn blank_api_key_is_a_configuration_error() {
        let source = map(&[(API_KEY, "   "), (MODEL, "gemini-2.5-pro")]);
        let err = Config::from_source(&source).unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[test]
    fn model_falls_back_to_default() {
        let config = Config::from_source(&map(&[(API_KEY, " secret ")])).unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.model_name, DEFAULT_MODEL);
    }

    #[test]
    fn first_non_blank_layer_wins() {
        let layered = LayeredConfig::new()
            .with_layer(map(&[(MODEL, "override-model"), (API_KEY, "")]))
            .with_layer(map(&[(API_KEY, "from-settings"), (MODEL, "settings-model")]));

        assert_eq!(layered.get(API_KEY).as_deref(), Some("from-settings"));
        assert_eq!(layered.get(MODEL).as_deref(), Some("override-model"));
        assert_eq!(layered.get("unknown"), None);
    }
}
