//! Runtime configuration.
//!
//! Everything has a default, so the binary runs without a config file. A YAML
//! file passed with `--config` may override any subset of the fields:
//!
//! ```yaml
//! feed:
//!   title: "HN: 200+ points"
//! site_base: "https://news.ycombinator.com"
//! pace_interval_ms: 1500
//! http:
//!   timeout_secs: 5
//! ```

use std::error::Error;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, instrument};

use crate::http::HttpConfig;
use crate::models::FeedMetadata;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Channel metadata of the generated feed.
    pub feed: FeedMetadata,
    /// Base URL of the JSON API.
    pub api_base: String,
    /// Base URL of the site (front page and discussion pages).
    pub site_base: String,
    /// Minimum delay between enrichment requests.
    pub pace_interval_ms: u64,
    pub http: HttpConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed: FeedMetadata::default(),
            api_base: "https://hacker-news.firebaseio.com/v0".to_string(),
            site_base: "https://news.ycombinator.com".to_string(),
            pace_interval_ms: 1000,
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Load the configuration from `path`, or the defaults when no path is given.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&Path>) -> Result<Self, Box<dyn Error>> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path).await?;
        let config = Self::from_yaml(&raw)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.pace_interval_ms, 1000);
        assert_eq!(config.http.timeout_secs, 10);
        assert_eq!(config.api_base, "https://hacker-news.firebaseio.com/v0");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml(
            "feed:\n  title: Custom\npace_interval_ms: 250\nhttp:\n  timeout_secs: 3\n",
        )
        .unwrap();
        assert_eq!(config.feed.title, "Custom");
        assert_eq!(config.feed.language, "en-us");
        assert_eq!(config.pace_interval_ms, 250);
        assert_eq!(config.http.timeout_secs, 3);
        assert!(config.http.user_agent.starts_with("Mozilla"));
        assert_eq!(config.site_base, "https://news.ycombinator.com");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(Config::from_yaml("pace_interval_ms: [oops").is_err());
    }

    #[tokio::test]
    async fn test_load_without_path() {
        assert_eq!(Config::load(None).await.unwrap(), Config::default());
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        assert!(Config::load(Some(Path::new("/definitely/not/here.yaml"))).await.is_err());
    }
}
