//! Command-line interface definitions for the LA Times news scraper.
//!
//! Every option has a default, so running the binary with no arguments reads
//! `devdata/work-items.json` and writes to `output/`. Flags override the
//! values from the optional YAML config file.

use crate::config::ScraperConfig;
use crate::models::MissingDatePolicy;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the scraper.
///
/// # Examples
///
/// ```sh
/// # Process the local work item file with default settings
/// latimes_news_scraper
///
/// # Custom input, output and a visible browser
/// latimes_news_scraper -w items.json -o ./out --headed
///
/// # Keep undated results instead of dropping them
/// latimes_news_scraper --on-missing-date sentinel
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// JSON file holding the work items to process
    #[arg(
        short,
        long,
        env = "RC_WORKITEM_INPUT_PATH",
        default_value = "devdata/work-items.json"
    )]
    pub work_items: PathBuf,

    /// Directory for the workbook and downloaded images (overrides the config file)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Optional path to config.yaml file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// What to do with results whose date is missing or unreadable
    #[arg(long, value_enum)]
    pub on_missing_date: Option<MissingDatePolicy>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,
}

impl Cli {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, config: &mut ScraperConfig) {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(policy) = self.on_missing_date {
            config.on_missing_date = policy;
        }
        if self.headed {
            config.browser.headless = false;
        }
    }
}
