//! # LA Times News Scraper
//!
//! Searches the Los Angeles Times for a phrase, keeps the results published
//! within a number of months, and records them in an Excel workbook together
//! with their downloaded images.
//!
//! ## Usage
//!
//! ```sh
//! latimes_news_scraper -w devdata/work-items.json -o ./output
//! ```
//!
//! ## Architecture
//!
//! Each work item is processed in order against one shared browser:
//! 1. **Navigation**: open the site, submit the search, sort by newest and
//!    tick the requested category
//! 2. **Scraping**: read every result on the page, dropping or marking
//!    undated ones and stopping after the page that crosses the cutoff
//! 3. **Persistence**: append rows to the workbook every few results and
//!    once more when the run stops

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};
use url::Url;

mod browser;
mod cli;
mod config;
mod dates;
mod error;
mod images;
mod models;
mod outputs;
mod scrapers;
mod utils;
mod workitems;

use browser::chrome::ChromeNavigator;
use cli::Cli;
use config::{load_config, ScraperConfig};
use images::HttpImageFetcher;
use models::{Payload, SearchCriteria};
use outputs::excel::XlsxSink;
use scrapers::article::ArticleExtractor;
use scrapers::latimes::LaTimesSite;
use scrapers::page::PageScraper;
use scrapers::pagination::{PaginationController, RunSummary};
use utils::{ensure_writable_dir, truncate_for_log};
use workitems::load_work_items;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("latimes_news_scraper starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.work_items, ?args.output_dir, ?args.config, "Parsed CLI arguments");

    let mut config = load_config(args.config.as_deref()).await?;
    args.apply(&mut config);
    config.validate()?;

    // Early check: ensure output dir is writable
    if let Err(e) = ensure_writable_dir(&config.output_dir).await {
        error!(
            path = %config.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let payloads = load_work_items(&args.work_items).await?;
    if payloads.is_empty() {
        warn!(path = %args.work_items.display(), "No work items to process");
        return Ok(());
    }

    let base_url = config.base_url()?;
    let fetcher = HttpImageFetcher::new(config.image_download_timeout())?;
    let mut sink = XlsxSink::new(config.workbook_path(), config.worksheet.clone());
    let mut navigator = ChromeNavigator::launch(&config.browser_options()).await?;
    info!(headless = config.browser.headless, "Browser launched");

    let mut failed = 0usize;
    for (index, payload) in payloads.iter().enumerate() {
        match run_work_item(&navigator, &fetcher, &mut sink, &config, &base_url, payload).await {
            Ok(summary) => info!(
                index,
                pages = summary.pages,
                persisted = summary.persisted,
                reason = ?summary.stop_reason,
                "Work item complete"
            ),
            Err(e) => {
                failed += 1;
                error!(index, phrase = %truncate_for_log(&payload.search_phrase, 80), error = %e, "Work item failed");
            }
        }
    }

    navigator.shutdown().await;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        work_items = payloads.len(),
        failed,
        workbook = %sink.path().display(),
        "Execution complete"
    );

    if failed > 0 {
        return Err(format!("{failed} of {} work items failed", payloads.len()).into());
    }
    Ok(())
}

/// Search, filter and scrape one work item into `sink`.
#[instrument(level = "info", skip_all, fields(phrase = %payload.search_phrase, period = payload.period))]
async fn run_work_item(
    navigator: &ChromeNavigator,
    fetcher: &HttpImageFetcher,
    sink: &mut XlsxSink,
    config: &ScraperConfig,
    base_url: &Url,
    payload: &Payload,
) -> Result<RunSummary, Box<dyn Error>> {
    let criteria = SearchCriteria::from_payload(payload, Local::now().naive_local());
    info!(cutoff = %criteria.cutoff, category = ?criteria.category, "Search criteria");

    let site = LaTimesSite::new(navigator, base_url, config.site_timeouts());
    site.open_news_website().await?;
    site.input_search_phrase(&criteria.phrase).await?;
    site.apply_filters(criteria.category.as_deref()).await;
    tokio::time::sleep(config.search_settle()).await;

    let image_dir: &Path = &config.output_dir;
    let extractor = ArticleExtractor::new(fetcher, image_dir, base_url, config.filename_limits());
    let scraper = PageScraper::new(navigator, extractor, config.on_missing_date);
    let mut controller =
        PaginationController::new(navigator, scraper, sink, config.pagination_settings());
    Ok(controller.run(&criteria).await?)
}
