use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::ClientConfig;
use crate::provider::Provider;

/// Environment variable checked before the config file for the API key
pub const API_KEY_ENV: &str = "PERPLEXITY_API_KEY";

/// Milliseconds between two revealed characters
pub const DEFAULT_REVEAL_INTERVAL_MS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to access config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// User settings stored as JSON; every field is optional and falls back to a default.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub timeout_secs: Option<u64>,
    pub retry_transient: Option<bool>,
    pub reveal_interval_ms: Option<u64>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            provider: Some(Provider::default().as_str().to_string()),
            ..Self::default()
        }
    }

    /// Load from the default location, or defaults if there's no file yet.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, content).map_err(io_err)?;
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("parley").join("config.json"))
    }

    pub fn provider(&self) -> Provider {
        self.provider
            .as_deref()
            .and_then(Provider::from_str)
            .unwrap_or_default()
    }

    pub fn reveal_interval(&self) -> Duration {
        Duration::from_millis(
            self.reveal_interval_ms
                .unwrap_or(DEFAULT_REVEAL_INTERVAL_MS)
                .max(1),
        )
    }

    /// Pick the API key: a non-blank environment value wins over the file.
    pub fn resolve_api_key(&self, env_key: Option<String>) -> Option<String> {
        env_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.trim().is_empty()))
    }

    /// Client settings with the key looked up in the process environment.
    pub fn client_config(&self) -> ClientConfig {
        self.client_config_with_env(std::env::var(API_KEY_ENV).ok())
    }

    pub fn client_config_with_env(&self, env_key: Option<String>) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            api_key: self.resolve_api_key(env_key),
            api_url: self.api_url.clone().unwrap_or(defaults.api_url),
            model: self.model.clone().unwrap_or(defaults.model),
            system_prompt: self.system_prompt.clone().unwrap_or(defaults.system_prompt),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            top_p: self.top_p.unwrap_or(defaults.top_p),
            timeout: self
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            retry_transient: self.retry_transient.unwrap_or(defaults.retry_transient),
            retry_backoff: defaults.retry_backoff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{DEFAULT_API_URL, DEFAULT_MODEL};

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, Config::new());
        assert_eq!(config.provider(), Provider::Perplexity);
    }

    #[test]
    fn saves_and_loads_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            provider: Some("mock".to_string()),
            model: Some("sonar".to_string()),
            reveal_interval_ms: Some(5),
            ..Config::new()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.provider(), Provider::Mock);
        assert_eq!(loaded.reveal_interval(), Duration::from_millis(5));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn env_key_wins_over_file_key() {
        let config = Config {
            api_key: Some("from-file".to_string()),
            ..Config::new()
        };
        assert_eq!(
            config.resolve_api_key(Some("from-env".to_string())).as_deref(),
            Some("from-env")
        );
        assert_eq!(config.resolve_api_key(Some("  ".to_string())).as_deref(), Some("from-file"));
        assert_eq!(config.resolve_api_key(None).as_deref(), Some("from-file"));
        assert_eq!(Config::new().resolve_api_key(None), None);
    }

    #[test]
    fn client_config_fills_defaults() {
        let client = Config::new().client_config_with_env(None);
        assert_eq!(client.api_url, DEFAULT_API_URL);
        assert_eq!(client.model, DEFAULT_MODEL);
        assert_eq!(client.max_tokens, 1000);
        assert!(client.api_key.is_none());
    }
}
