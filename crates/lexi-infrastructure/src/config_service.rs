//! Client configuration loading.

use crate::paths::LexiPaths;
use lexi_core::config::ClientConfig;
use lexi_core::error::{LexiError, Result};
use std::path::{Path, PathBuf};

/// Environment variable that overrides `api_base_url`.
pub const API_BASE_URL_ENV: &str = "LEXI_API_BASE_URL";

/// Loads [`ClientConfig`] from `config.toml`.
///
/// Priority (highest first):
/// 1. `LEXI_API_BASE_URL` (base URL only)
/// 2. the TOML file
/// 3. built-in defaults
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Uses `config.toml` in the platform config directory.
    pub fn new_default() -> Result<Self> {
        let path = LexiPaths::default()
            .config_file()
            .map_err(|e| LexiError::config(e.to_string()))?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<ClientConfig> {
        let mut config = self.load_file()?;
        if let Ok(url) = std::env::var(API_BASE_URL_ENV) {
            if !url.trim().is_empty() {
                config.api_base_url = url;
            }
        }
        normalize(config)
    }

    /// Loads the config and then applies a base URL given on the command line.
    pub fn load_with_override(&self, api_base_url: Option<&str>) -> Result<ClientConfig> {
        let mut config = self.load()?;
        if let Some(url) = api_base_url {
            config.api_base_url = url.to_string();
            config = normalize(config)?;
        }
        Ok(config)
    }

    fn load_file(&self) -> Result<ClientConfig> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                tracing::debug!(path = %self.path.display(), "Loading config");
                Ok(toml::from_str(&content)?)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No config file; using defaults");
                Ok(ClientConfig::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn normalize(mut config: ClientConfig) -> Result<ClientConfig> {
    let trimmed = config.api_base_url.trim().trim_end_matches('/').to_string();
    reqwest::Url::parse(&trimmed).map_err(|e| {
        LexiError::config(format!("invalid api_base_url '{}': {}", config.api_base_url, e))
    })?;
    config.api_base_url = trimmed;
    if config.request_timeout_secs == 0 {
        return Err(LexiError::config("request_timeout_secs must be greater than zero"));
    }
    Ok(config)
}
