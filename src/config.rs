//! Client configuration management.
//!
//! Configuration covers the API base URL and the directory the token pair
//! is persisted in. It is stored at `~/.config/ecopoints/config.json`; the
//! `ECOPOINTS_API_URL` environment variable (or a `.env` file) overrides
//! the base URL without touching the file.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "ecopoints";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the API base URL
const API_URL_ENV: &str = "ECOPOINTS_API_URL";

/// Local development backend
const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_base_url: String,
    /// Where tokens are persisted; defaults to the platform data directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            data_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if present (silently ignore if not found)
        let _ = dotenvy::dotenv();

        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.is_empty() {
                config.api_base_url = url;
            }
        }
        Ok(config)
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

    /// Directory the credential store writes to.
    pub fn data_dir(&self) -> PathBuf {
        if let Some(ref dir) = self.data_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_NAME)
    }
}
