//! Scraper configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```yaml
//! base_url: "https://m.facebook.com/"
//! timeout_secs: 60
//! full_size_images: false
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument};
use url::Url;

use crate::error::ScrapeError;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/76.0.3809.87 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Mobile site root; seed URLs and cursors are resolved against it.
    pub base_url: Url,
    /// Desktop site root, used by the reaction/share enrichment fetch.
    pub desktop_base_url: Url,
    pub user_agent: String,
    pub accept_language: String,
    /// Value of the `locale` cookie sent with every request.
    pub locale: String,
    pub timeout_secs: u64,
    /// Follow photo links to find the full-size image (one extra request per
    /// photo post).
    pub full_size_images: bool,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("https://m.facebook.com/").unwrap(),
            desktop_base_url: Url::parse("https://www.facebook.com/").unwrap(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "en-US,en;q=0.5".to_string(),
            locale: "en_US".to_string(),
            timeout_secs: 30,
            full_size_images: true,
        }
    }
}

impl ScraperConfig {
    /// Config whose mobile and desktop roots both point at `base_url`.
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            desktop_base_url: base_url.clone(),
            base_url,
            ..Self::default()
        }
    }
}

/// Load a YAML config file.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub async fn load_config(path: impl AsRef<Path>) -> Result<ScraperConfig, ScrapeError> {
    let raw = tokio::fs::read_to_string(path.as_ref()).await?;
    let config: ScraperConfig = serde_yaml::from_str(&raw)?;
    info!(base_url = %config.base_url, "Loaded configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScraperConfig::default();
        assert_eq!(config.base_url.as_str(), "https://m.facebook.com/");
        assert_eq!(config.desktop_base_url.as_str(), "https://www.facebook.com/");
        assert!(config.user_agent.contains("Chrome/76"));
        assert_eq!(config.locale, "en_US");
        assert!(config.full_size_images);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: ScraperConfig =
            serde_yaml::from_str("timeout_secs: 5\nfull_size_images: false\n").unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert!(!config.full_size_images);
        assert_eq!(config.base_url.as_str(), "https://m.facebook.com/");
    }

    #[test]
    fn test_with_base_url() {
        let base = Url::parse("http://127.0.0.1:8080/").unwrap();
        let config = ScraperConfig::with_base_url(base.clone());
        assert_eq!(config.base_url, base);
        assert_eq!(config.desktop_base_url, base);
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "base_url: \"https://mbasic.facebook.com/\"\nlocale: de_DE\n").unwrap();

        let config = load_config(&path).await.unwrap();
        assert_eq!(config.base_url.as_str(), "https://mbasic.facebook.com/");
        assert_eq!(config.locale, "de_DE");
        assert_eq!(config.timeout_secs, 30);
    }

    #[tokio::test]
    async fn test_load_config_rejects_bad_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "timeout_secs: [not a number\n").unwrap();
        assert!(matches!(load_config(&path).await, Err(ScrapeError::Config(_))));
    }
}
