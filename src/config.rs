//! This module reads the optional `config.json` from the user's config
//! directory. At the moment it only configures the advisory text service.
//!
//! Every field has a default, so a missing or partial file is fine. The
//! connection settings can also be overridden from the environment, which
//! is the usual place to keep an API key.

use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};

use app_dirs2::AppDataType;
use serde::{Deserialize, Serialize};

use super::errors::*;
use super::files;

/// Overrides `AdviceConfig::api_url`
pub const ENV_API_URL: &str = "READPACE_API_URL";
/// Overrides `AdviceConfig::api_model`
pub const ENV_API_MODEL: &str = "READPACE_API_MODEL";
/// Overrides `AdviceConfig::api_key`
pub const ENV_API_KEY: &str = "READPACE_API_KEY";

/// Connection details for an OpenAI-compatible chat completions service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AdviceConfig {
    /// Base URL, with or without a trailing `/v1`
    pub api_url: String,
    pub api_model: String,
    /// An empty key turns advice off
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for AdviceConfig {
    fn default() -> AdviceConfig {
        AdviceConfig {
            api_url: "https://api.openai.com/v1".into(),
            api_model: "gpt-4o-mini".into(),
            api_key: String::new(),
            timeout_secs: 10,
        }
    }
}

impl AdviceConfig {
    /// Returns whether there is enough here to attempt a request.
    pub fn is_enabled(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.api_url.trim().is_empty()
    }

    /// Replaces fields with values found by `lookup`, which is given the
    /// names of the `ENV_*` variables. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
        where F: Fn(&str) -> Option<String>
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty(ENV_API_URL) {
            self.api_url = url;
        }
        if let Some(model) = non_empty(ENV_API_MODEL) {
            self.api_model = model;
        }
        if let Some(key) = non_empty(ENV_API_KEY) {
            self.api_key = key;
        }
    }
}

/// The contents of `config.json`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub advice: AdviceConfig,
}

/// Returns the location of the config file.
pub fn config_path() -> Result<PathBuf> {
    let mut path = files::app_dir(AppDataType::UserConfig)?;
    path.push("config.json");
    Ok(path)
}

/// Loads the config file from the user's config directory and applies the
/// environment overrides.
pub fn load_config() -> Result<Config> {
    let mut config = load_config_from(&config_path()?)?;
    config.advice.apply_overrides(|name| env::var(name).ok());
    Ok(config)
}

/// Loads a config file, returning the default config if it doesn't exist.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!("no config file at {}", path.display());
        return Ok(Config::default());
    }
    let f = File::open(path).chain_err(|| ErrorKind::Io(format!("could not open config file '{}'", path.display())))?;

    serde_json::from_reader(f).chain_err(|| ErrorKind::Json(format!("json error in config file '{}'", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;

    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = load_config_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert!(!config.advice.is_enabled());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"advice":{"api_key":"sk-test"}}"#).unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.advice.api_key, "sk-test");
        assert_eq!(config.advice.api_model, AdviceConfig::default().api_model);
        assert_eq!(config.advice.timeout_secs, 10);
        assert!(config.advice.is_enabled());
    }

    #[test]
    fn bad_json_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        match load_config_from(&path) {
            Err(Error(ErrorKind::Json(_), _)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn overrides_replace_non_empty_values() {
        let mut env = HashMap::new();
        env.insert(ENV_API_URL, "http://localhost:11434".to_owned());
        env.insert(ENV_API_MODEL, "  ".to_owned());
        env.insert(ENV_API_KEY, "local".to_owned());

        let mut advice = AdviceConfig::default();
        advice.apply_overrides(|name| env.get(name).cloned());

        assert_eq!(advice.api_url, "http://localhost:11434");
        assert_eq!(advice.api_model, "gpt-4o-mini");
        assert_eq!(advice.api_key, "local");
    }
}
