use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://www.cbr.ru/scripts/XML_daily.asp";
pub const BOT_TOKEN_ENV: &str = "BOT_TOKEN";

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_cache_ttl_seconds() -> u64 {
    3600
}

fn default_items_per_page() -> usize {
    8
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,
    #[serde(default = "default_items_per_page")]
    pub items_per_page: usize,
    #[serde(default)]
    pub bot_token: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_url: default_api_url(),
            cache_ttl_seconds: default_cache_ttl_seconds(),
            items_per_page: default_items_per_page(),
            bot_token: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("ru", "kursbot", "kursbot")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    /// Bot token from the environment, falling back to the config file.
    pub fn resolve_bot_token(&self) -> Option<String> {
        std::env::var(BOT_TOKEN_ENV)
            .ok()
            .filter(|token| !token.trim().is_empty())
            .or_else(|| self.bot_token.clone())
            .filter(|token| !token.trim().is_empty())
    }
}
