use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use config::Config;
use serde::Deserialize;

use crate::parser::selectors::SelectorConfig;

const CONFIG_FILE: &str = "shop_scraper";
const ENV_PREFIX: &str = "SHOP_SCRAPER";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Origin relative image paths are resolved against.
    pub site_origin: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub public_dir: PathBuf,
    /// Relative to `public_dir`.
    pub staging_dir: String,
    /// Relative to `public_dir`.
    pub products_dir: String,
    pub default_image_ext: String,
    pub db_path: PathBuf,
    pub error_log_path: PathBuf,
    pub selectors: SelectorConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            site_origin: "https://shop.example.com".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            public_dir: PathBuf::from("public"),
            staging_dir: "images/temp".to_string(),
            products_dir: "images/products".to_string(),
            default_image_ext: "jpg".to_string(),
            db_path: PathBuf::from("data/products.sqlite"),
            error_log_path: PathBuf::from("logs/errors.json"),
            selectors: SelectorConfig::default(),
        }
    }
}

impl Settings {
    /// `shop_scraper.toml` (optional) overlaid with `SHOP_SCRAPER__*` env vars.
    pub fn load() -> Result<Self> {
        Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
