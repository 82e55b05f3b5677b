//! Application configuration management.
//!
//! Configuration is stored at `~/.config/docve/config.json` and holds the API
//! base URL, the last used username and the session storage backend.
//! Environment variables take precedence over the file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::{FileSessionStore, KeyringSessionStore, SharedSessionStore};

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "docve";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Base URL of the hosted Docve API
pub const DEFAULT_API_BASE_URL: &str = "https://docve.azurewebsites.net/api";

pub const ENV_API_URL: &str = "DOCVE_API_URL";
pub const ENV_USERNAME: &str = "DOCVE_USERNAME";
pub const ENV_PASSWORD: &str = "DOCVE_PASSWORD";

/// Where the bearer token is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub last_username: Option<String>,
    #[serde(default)]
    pub session_backend: SessionBackend,
    /// `--api-url` from the command line; beats every other source
    #[serde(skip)]
    pub api_url_override: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the session file and logs.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    pub fn log_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("logs"))
    }

    /// API base URL: `--api-url`, then `DOCVE_API_URL`, then the config file,
    /// then the hosted default.
    pub fn api_base_url(&self) -> String {
        let explicit = self
            .api_url_override
            .clone()
            .or_else(|| std::env::var(ENV_API_URL).ok());
        resolve_api_base_url(explicit, self.api_base_url.as_deref())
    }

    /// Username to prefill the login form with.
    pub fn prefill_username(&self) -> Option<String> {
        std::env::var(ENV_USERNAME)
            .ok()
            .filter(|u| !u.is_empty())
            .or_else(|| self.last_username.clone())
    }

    /// Build the configured session store.
    pub fn session_store(&self) -> Result<SharedSessionStore> {
        let store: SharedSessionStore = match self.session_backend {
            SessionBackend::File => {
                let dir = self.data_dir()?;
                debug!(dir = %dir.display(), "Using file session store");
                Arc::new(FileSessionStore::new(dir))
            }
            SessionBackend::Keyring => {
                debug!("Using keyring session store");
                Arc::new(KeyringSessionStore::new()?)
            }
        };
        Ok(store)
    }
}

fn resolve_api_base_url(env_value: Option<String>, configured: Option<&str>) -> String {
    let url = env_value
        .filter(|v| !v.trim().is_empty())
        .or_else(|| configured.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
    url.trim_end_matches('/').to_string()
}
