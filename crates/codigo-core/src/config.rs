use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};
use tracing::warn;

pub const DEFAULT_CHAT_URL: &str = "http://localhost:8000/chat";
pub const DEFAULT_COMPARE_URL: &str = "http://localhost:8000/comparar";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const CHAT_URL_VAR: &str = "CODIGO_CHAT_URL";
const COMPARE_URL_VAR: &str = "CODIGO_COMPARE_URL";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub chat_url: String,
    pub compare_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            chat_url: DEFAULT_CHAT_URL.to_string(),
            compare_url: DEFAULT_COMPARE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Load from the user config dir, then apply env overrides.
    ///
    /// On first run a config file with the defaults is written so there is
    /// something to edit.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        if !config_path.exists() {
            if let Err(e) = Self::new().save_to(&config_path) {
                warn!(error = %e, path = %config_path.display(), "could not write default config");
            }
        }

        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Replace endpoints with `CODIGO_CHAT_URL` / `CODIGO_COMPARE_URL` when set.
    pub fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var(CHAT_URL_VAR) {
            self.chat_url = url;
        }
        if let Some(url) = var(COMPARE_URL_VAR) {
            self.compare_url = url;
        }
    }

    /// True when the chat endpoint is still the built-in localhost default.
    pub fn uses_default_chat_url(&self) -> bool {
        self.chat_url == DEFAULT_CHAT_URL
    }

    /// Missing file means defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Reject endpoints that were left blank or aren't URLs.
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [("chat_url", &self.chat_url), ("compare_url", &self.compare_url)] {
            if url.trim().is_empty() {
                return Err(anyhow!("{} is not configured", name));
            }
            reqwest::Url::parse(url).map_err(|e| anyhow!("{} '{}' is invalid: {}", name, url, e))?;
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("timeout_secs must be greater than zero"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("codigo"))
    }

    fn get_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }
}
