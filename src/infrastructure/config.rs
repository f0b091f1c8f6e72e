//! Configuration infrastructure
//!
//! Serde-backed application configuration with a JSON file on disk. Missing
//! files fall back to defaults so a first run needs no setup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tracing::info;

/// Default values shared by the config structs and tests.
pub mod defaults {
    /// Storefront origin all requests go to
    pub const BASE_URL: &str = "https://apps.shopify.com";

    /// Directory holding input and output datasets
    pub const DATA_DIR: &str = "data";

    /// Politeness delay between requests to the origin, in milliseconds
    pub const REQUEST_DELAY_MS: u64 = 2000;

    /// Total attempts per target (first attempt plus one retry)
    pub const MAX_RETRIES: u32 = 2;

    /// Request timeout in seconds
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    /// Browser-like user agent sent with every request
    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
        AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

    /// Concurrent detail fetches; 1 preserves strict input order
    pub const MAX_CONCURRENT: usize = 1;

    /// Upper bound on listing pages walked during discovery
    pub const DISCOVERY_MAX_PAGES: u32 = 100;

    /// Default log level filter
    pub const LOG_LEVEL: &str = "info";
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Storefront origin, also the base for joining listing handles
    pub base_url: String,

    /// Directory for input datasets, output datasets and the run manifest
    pub data_dir: PathBuf,

    pub scraping: ScrapingConfig,
    pub discovery: DiscoveryConfig,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::BASE_URL.to_string(),
            data_dir: PathBuf::from(defaults::DATA_DIR),
            scraping: ScrapingConfig::default(),
            discovery: DiscoveryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Detail-scraping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// Minimum delay between requests to the origin, in milliseconds
    pub request_delay_ms: u64,

    /// Total attempts per target, fetch and extraction alike
    pub max_retries: u32,

    /// Request timeout in seconds
    pub request_timeout_seconds: u64,

    /// User agent sent with every request
    pub user_agent: String,

    /// Bounded worker pool size; the politeness delay still applies per origin
    pub max_concurrent: usize,

    /// Optional cap on targets processed in one session
    pub batch_size: Option<usize>,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: defaults::REQUEST_DELAY_MS,
            max_retries: defaults::MAX_RETRIES,
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            user_agent: defaults::USER_AGENT.to_string(),
            max_concurrent: defaults::MAX_CONCURRENT,
            batch_size: None,
        }
    }
}

impl ScrapingConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// Attempt bound with a floor of one; zero retries would never fetch.
    pub fn effective_retries(&self) -> u32 {
        self.max_retries.max(1)
    }
}

/// Listing discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Upper bound on listing pages walked before giving up
    pub max_pages: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_pages: defaults::DISCOVERY_MAX_PAGES,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level filter when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
        }
    }
}

/// Loads and persists the configuration file.
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Load the configuration, falling back to defaults when the file does
    /// not exist yet.
    pub async fn load_or_default(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!(
                "no config file at {}, using defaults",
                self.config_path.display()
            );
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .with_context(|| format!("failed to read config {}", self.config_path.display()))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config {}", self.config_path.display()))?;
        Ok(config)
    }

    /// Write the configuration back to disk, creating parent directories.
    pub async fn save(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .context("failed to create config directory")?;
            }
        }
        let content =
            serde_json::to_string_pretty(config).context("failed to serialize config")?;
        fs::write(&self.config_path, content)
            .await
            .with_context(|| format!("failed to write config {}", self.config_path.display()))?;
        Ok(())
    }
}
