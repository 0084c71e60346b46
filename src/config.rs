use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

const APP_DIR: &str = "feed-snapshot";
const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,

    #[serde(default = "default_snapshot_limit")]
    pub snapshot_limit: usize,

    #[serde(default = "default_feeds")]
    pub feeds: Vec<String>,

    pub opml_path: Option<String>,

    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    #[serde(default)]
    pub annotations: AnnotationConfig,
}

/// Settings for the optional summary/title rewriting service.
///
/// Enrichment is enabled exactly when `api_key` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    pub api_key: Option<String>,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_min_text_chars")]
    pub min_text_chars: usize,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_enrichment_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationMode {
    #[default]
    Scrape,
    Fixture,
    Simulate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationConfig {
    #[serde(default)]
    pub mode: AnnotationMode,

    pub url: Option<String>,

    pub selector: Option<String>,

    pub fixture_path: Option<String>,

    #[serde(default)]
    pub seed: u64,

    #[serde(default = "default_max_comments")]
    pub max_comments: usize,
}

fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn default_db_path() -> String {
    app_data_dir().join("data.db").to_string_lossy().to_string()
}

fn default_snapshot_path() -> String {
    app_data_dir()
        .join("snapshot")
        .join("articles.json")
        .to_string_lossy()
        .to_string()
}

fn default_snapshot_limit() -> usize {
    100
}

fn default_feeds() -> Vec<String> {
    vec!["https://news.yahoo.co.jp/rss/topics/it.xml".to_string()]
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("{}/{}", APP_DIR, env!("CARGO_PKG_VERSION"))
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_min_text_chars() -> usize {
    50
}

fn default_max_tokens() -> u32 {
    300
}

fn default_enrichment_timeout() -> u64 {
    60
}

fn default_max_comments() -> usize {
    5
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: default_api_base(),
            model: default_model(),
            min_text_chars: default_min_text_chars(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_enrichment_timeout(),
        }
    }
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            mode: AnnotationMode::default(),
            url: None,
            selector: None,
            fixture_path: None,
            seed: 0,
            max_comments: default_max_comments(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            snapshot_path: default_snapshot_path(),
            snapshot_limit: default_snapshot_limit(),
            feeds: default_feeds(),
            opml_path: None,
            fetch_timeout_secs: default_fetch_timeout(),
            user_agent: default_user_agent(),
            enrichment: EnrichmentConfig::default(),
            annotations: AnnotationConfig::default(),
        }
    }
}

impl Config {
    /// Load the config from `path` (or the default location), creating it with
    /// defaults when missing. `OPENAI_API_KEY` fills an unset enrichment key.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::config_path);

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)?
        } else {
            let config = Config::default();
            config.save(&config_path)?;
            config
        };

        if config.enrichment.api_key.is_none() {
            config.enrichment.api_key = std::env::var(API_KEY_ENV)
                .ok()
                .filter(|key| !key.trim().is_empty());
        }

        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.snapshot_limit == 0 {
            return Err(AppError::Config(
                "snapshot_limit must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn save(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    /// Configured feed URLs followed by the OPML ones, first occurrence wins.
    pub fn feed_urls(&self) -> Result<Vec<String>> {
        let mut urls = self.feeds.clone();
        if let Some(opml_path) = &self.opml_path {
            urls.extend(crate::feed::parse_opml_file(Path::new(opml_path))?);
        }

        let mut seen = std::collections::HashSet::new();
        urls.retain(|url| seen.insert(url.clone()));
        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.snapshot_limit, 100);
        assert_eq!(config.fetch_timeout_secs, 30);
        assert!(config.enrichment.api_key.is_none());
        assert_eq!(config.enrichment.min_text_chars, 50);
        assert_eq!(config.annotations.mode, AnnotationMode::Scrape);
        assert_eq!(config.annotations.max_comments, 5);
    }

    #[test]
    fn parses_sections() {
        let config = Config::from_toml(
            r#"
            db_path = "/tmp/x.db"
            feeds = ["http://a/rss", "http://b/rss"]

            [enrichment]
            api_key = "sk-test"
            model = "gpt-4o-mini"

            [annotations]
            mode = "simulate"
            seed = 42
            "#,
        )
        .unwrap();

        assert_eq!(config.db_path, "/tmp/x.db");
        assert_eq!(config.feeds.len(), 2);
        assert_eq!(config.enrichment.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.enrichment.model, "gpt-4o-mini");
        assert_eq!(config.enrichment.api_base, "https://api.openai.com/v1");
        assert_eq!(config.annotations.mode, AnnotationMode::Simulate);
        assert_eq!(config.annotations.seed, 42);
    }

    #[test]
    fn rejects_zero_snapshot_limit() {
        let err = Config::from_toml("snapshot_limit = 0").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn feed_urls_merges_opml_without_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let opml_path = dir.path().join("feeds.opml");
        std::fs::write(
            &opml_path,
            r#"<?xml version="1.0"?>
<opml version="2.0">
  <head><title>Feeds</title></head>
  <body>
    <outline text="A" xmlUrl="http://a/rss"/>
    <outline text="Tech">
      <outline text="C" xmlUrl="http://c/rss"/>
    </outline>
  </body>
</opml>"#,
        )
        .unwrap();

        let config = Config {
            feeds: vec!["http://a/rss".to_string(), "http://b/rss".to_string()],
            opml_path: Some(opml_path.to_string_lossy().to_string()),
            ..Config::default()
        };

        assert_eq!(
            config.feed_urls().unwrap(),
            vec!["http://a/rss", "http://b/rss", "http://c/rss"]
        );
    }

    #[test]
    fn save_then_load_roundtrips_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            db_path: "/var/lib/feeds.db".to_string(),
            ..Config::default()
        };
        config.save(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.db_path, "/var/lib/feeds.db");
    }
}
