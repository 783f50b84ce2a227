//! Configuration management for Shiori.
//!
//! Handles loading, saving, and validating configuration from
//! platform-specific config directories.

use crate::error::ConfigError;
use crate::site::{QUERY_SLOT, SiteProfile, SiteRegistry, default_sites};
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application name used for config directory.
const APP_NAME: &str = "Shiori";

/// Default config filename.
const CONFIG_FILENAME: &str = "config.toml";

/// Browser-like user agent sent with every request.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Web scraping settings.
    pub scraping: ScrapingConfig,

    /// File paths.
    pub paths: PathsConfig,

    /// Site profiles keyed by site id.
    pub sites: BTreeMap<String, SiteProfile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scraping: ScrapingConfig::default(),
            paths: PathsConfig::default(),
            sites: default_sites(),
        }
    }
}

/// Web scraping configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// Per-request timeout in seconds.
    pub timeout_sec: u64,

    /// User agent header sent with every request.
    pub user_agent: String,

    /// Lower bound of the delay between chapter fetches, in seconds.
    pub pacing_min_sec: f64,

    /// Upper bound (exclusive) of the delay between chapter fetches, in seconds.
    pub pacing_max_sec: f64,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            timeout_sec: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            pacing_min_sec: 1.0,
            pacing_max_sec: 3.0,
        }
    }
}

impl ScrapingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_sec)
    }
}

/// File path configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory that receives downloaded novels.
    pub output_directory: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Returns the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Returns the full path to the config file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(CONFIG_FILENAME))
    }

    /// Loads configuration from the default location.
    ///
    /// If the config file doesn't exist, creates a default one.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scraping.timeout_sec == 0 {
            return Err(invalid("scraping.timeout_sec", "must be greater than 0"));
        }

        let (min, max) = (self.scraping.pacing_min_sec, self.scraping.pacing_max_sec);
        if !min.is_finite() || min <= 0.0 {
            return Err(invalid("scraping.pacing_min_sec", "must be greater than 0"));
        }
        if !max.is_finite() || max < min {
            return Err(invalid(
                "scraping.pacing_max_sec",
                "must not be less than pacing_min_sec",
            ));
        }

        if self.sites.is_empty() {
            return Err(invalid("sites", "at least one site must be configured"));
        }

        for (id, site) in &self.sites {
            validate_site(id, site)?;
        }

        Ok(())
    }

    /// Builds the site registry from the configured profiles.
    pub fn registry(&self) -> SiteRegistry {
        SiteRegistry::new(self.sites.clone())
    }
}

fn validate_site(id: &str, site: &SiteProfile) -> Result<(), ConfigError> {
    let slots = site.search_url_template.matches(QUERY_SLOT).count();
    if slots != 1 {
        return Err(invalid(
            &format!("sites.{id}.search_url_template"),
            &format!("must contain exactly one '{QUERY_SLOT}' slot, found {slots}"),
        ));
    }

    if let Err(e) = url::Url::parse(&site.search_url("test")) {
        return Err(invalid(
            &format!("sites.{id}.search_url_template"),
            &format!("does not form an absolute URL: {e}"),
        ));
    }

    if let Err(e) = url::Url::parse(&site.base_url) {
        return Err(invalid(&format!("sites.{id}.base_url"), &e.to_string()));
    }

    for (key, selector) in site.selectors() {
        if let Err(e) = Selector::parse(selector) {
            return Err(invalid(&format!("sites.{id}.{key}"), &e.to_string()));
        }
    }

    Ok(())
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}
