//! Runtime configuration loaded from an optional YAML file.
//!
//! Every key has a default, so an empty file (or no file at all) yields a
//! working configuration:
//!
//! ```yaml
//! base_url: https://www.latimes.com/
//! output_dir: output
//! workbook: news_data.xlsx
//! worksheet: News Data
//! flush_threshold: 10
//! on_missing_date: skip
//! timeouts:
//!   page_load_secs: 60
//!   selector_secs: 20
//!   filter_settle_secs: 10
//!   search_settle_secs: 5
//!   page_settle_secs: 5
//!   image_download_secs: 30
//! browser:
//!   headless: true
//!   slow_mo_millis: 100
//! filenames:
//!   stem_chars: 30
//!   total_chars: 50
//! ```

use crate::browser::chrome::BrowserOptions;
use crate::error::ConfigError;
use crate::images::FilenameLimits;
use crate::models::MissingDatePolicy;
use crate::scrapers::latimes::SiteTimeouts;
use crate::scrapers::pagination::PaginationSettings;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScraperConfig {
    pub base_url: String,
    /// Directory receiving the workbook and downloaded images.
    pub output_dir: PathBuf,
    pub workbook: String,
    pub worksheet: String,
    pub flush_threshold: usize,
    pub on_missing_date: MissingDatePolicy,
    pub timeouts: TimeoutConfig,
    pub browser: BrowserConfig,
    pub filenames: FilenameConfig,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.latimes.com/".to_string(),
            output_dir: PathBuf::from("output"),
            workbook: "news_data.xlsx".to_string(),
            worksheet: "News Data".to_string(),
            flush_threshold: 10,
            on_missing_date: MissingDatePolicy::default(),
            timeouts: TimeoutConfig::default(),
            browser: BrowserConfig::default(),
            filenames: FilenameConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutConfig {
    pub page_load_secs: u64,
    pub selector_secs: u64,
    pub filter_settle_secs: u64,
    /// Pause between applying filters and reading the first page.
    pub search_settle_secs: u64,
    pub page_settle_secs: u64,
    pub image_download_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            page_load_secs: 60,
            selector_secs: 20,
            filter_settle_secs: 10,
            search_settle_secs: 5,
            page_settle_secs: 5,
            image_download_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrowserConfig {
    pub headless: bool,
    pub slow_mo_millis: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            slow_mo_millis: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilenameConfig {
    pub stem_chars: usize,
    pub total_chars: usize,
}

impl Default for FilenameConfig {
    fn default() -> Self {
        let limits = FilenameLimits::default();
        Self {
            stem_chars: limits.stem_chars,
            total_chars: limits.total_chars,
        }
    }
}

/// Load the configuration at `path`, or the defaults when `path` is `None`.
pub async fn load_config(path: Option<&Path>) -> Result<ScraperConfig, ConfigError> {
    let Some(path) = path else {
        debug!("No config file given; using defaults");
        return Ok(ScraperConfig::default());
    };

    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let config = parse_config(&raw).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

fn parse_config(raw: &str) -> Result<ScraperConfig, serde_yaml::Error> {
    // An empty document deserializes to unit, not to an empty mapping.
    if raw.trim().is_empty() {
        return Ok(ScraperConfig::default());
    }
    serde_yaml::from_str(raw)
}

impl ScraperConfig {
    /// Reject values that would make a run meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base_url()?;
        if self.flush_threshold == 0 {
            return Err(ConfigError::Invalid(
                "flush_threshold must be at least 1".to_string(),
            ));
        }
        if self.workbook.trim().is_empty() || self.worksheet.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "workbook and worksheet names must not be empty".to_string(),
            ));
        }
        if self.filenames.total_chars <= ".jpeg".len() {
            return Err(ConfigError::Invalid(format!(
                "filenames.total_chars must exceed {}",
                ".jpeg".len()
            )));
        }
        Ok(())
    }

    pub fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.base_url)
            .map_err(|e| ConfigError::Invalid(format!("base_url `{}`: {e}", self.base_url)))
    }

    pub fn workbook_path(&self) -> PathBuf {
        self.output_dir.join(&self.workbook)
    }

    pub fn image_download_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.image_download_secs)
    }

    pub fn search_settle(&self) -> Duration {
        Duration::from_secs(self.timeouts.search_settle_secs)
    }

    pub fn browser_options(&self) -> BrowserOptions {
        BrowserOptions {
            headless: self.browser.headless,
            slow_mo: Duration::from_millis(self.browser.slow_mo_millis),
            load_timeout: Duration::from_secs(self.timeouts.page_load_secs),
            ..Default::default()
        }
    }

    pub fn filename_limits(&self) -> FilenameLimits {
        FilenameLimits {
            stem_chars: self.filenames.stem_chars,
            total_chars: self.filenames.total_chars,
        }
    }

    pub fn pagination_settings(&self) -> PaginationSettings {
        PaginationSettings {
            flush_threshold: self.flush_threshold,
            page_settle: Duration::from_secs(self.timeouts.page_settle_secs),
        }
    }

    pub fn site_timeouts(&self) -> SiteTimeouts {
        SiteTimeouts {
            page_load: Duration::from_secs(self.timeouts.page_load_secs),
            selector: Duration::from_secs(self.timeouts.selector_secs),
            filter_settle: Duration::from_secs(self.timeouts.filter_settle_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(parse_config("").unwrap(), ScraperConfig::default());
        assert_eq!(parse_config("  \n").unwrap(), ScraperConfig::default());
    }

    #[test]
    fn test_partial_document_keeps_other_defaults() {
        let config = parse_config(
            "flush_threshold: 25\non_missing_date: sentinel\ntimeouts:\n  page_settle_secs: 1\nbrowser:\n  headless: false\n",
        )
        .unwrap();
        assert_eq!(config.flush_threshold, 25);
        assert_eq!(config.on_missing_date, MissingDatePolicy::Sentinel);
        assert_eq!(config.timeouts.page_settle_secs, 1);
        assert_eq!(config.timeouts.page_load_secs, 60);
        assert!(!config.browser.headless);
        assert_eq!(config.browser.slow_mo_millis, 100);
        assert_eq!(config.worksheet, "News Data");
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(parse_config("flush_treshold: 5\n").is_err());
    }

    #[test]
    fn test_validate() {
        assert!(ScraperConfig::default().validate().is_ok());

        let config = ScraperConfig {
            flush_threshold: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = ScraperConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ScraperConfig {
            filenames: FilenameConfig {
                stem_chars: 30,
                total_chars: 4,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_derived_settings() {
        let config = ScraperConfig {
            output_dir: PathBuf::from("/data/out"),
            ..Default::default()
        };
        assert_eq!(config.workbook_path(), PathBuf::from("/data/out/news_data.xlsx"));
        assert_eq!(config.site_timeouts(), SiteTimeouts::default());
        let pagination = config.pagination_settings();
        assert_eq!(pagination.flush_threshold, 10);
        assert_eq!(pagination.page_settle, Duration::from_secs(5));
        assert_eq!(config.browser_options().slow_mo, Duration::from_millis(100));
        assert_eq!(config.browser_options().load_timeout, Duration::from_secs(60));
        assert_eq!(config.filename_limits().total_chars, 50);
        assert_eq!(config.base_url().unwrap().as_str(), "https://www.latimes.com/");
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "output_dir: /tmp/scrape\nworkbook: results.xlsx").unwrap();

        let config = load_config(Some(file.path())).await.unwrap();
        assert_eq!(config.workbook_path(), PathBuf::from("/tmp/scrape/results.xlsx"));
    }

    #[tokio::test]
    async fn test_load_config_errors() {
        assert_eq!(load_config(None).await.unwrap(), ScraperConfig::default());

        let missing = load_config(Some(Path::new("/nonexistent/config.yaml"))).await;
        assert!(matches!(missing, Err(ConfigError::Io { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "flush_threshold: [1, 2]").unwrap();
        let bad = load_config(Some(file.path())).await;
        assert!(matches!(bad, Err(ConfigError::Yaml { .. })));
    }
}
