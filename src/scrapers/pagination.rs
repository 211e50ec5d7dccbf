//! Page-by-page scraping with batched persistence.
//!
//! [`PaginationController::run`] is an explicit state machine:
//!
//! | From | Event | To |
//! |------|-------|----|
//! | `Scraping` | first page, first result precedes the cutoff | `Stopped(NothingInRange)` |
//! | `Scraping` | reading the page failed | `Stopped(ExtractionFailed)` |
//! | `Scraping` | pending buffer reaches the flush threshold | `Flushing` |
//! | `Flushing` | buffer persisted and cleared | `Scraping` |
//! | `Scraping` | page consumed, next page wanted | `Paginating` |
//! | `Scraping` | page consumed, cutoff reached | `Stopped(CutoffReached)` |
//! | `Paginating` | next link clicked and loaded | `Scraping` on page + 1 |
//! | `Paginating` | no next link | `Stopped(NoNextPage)` |
//! | `Paginating` | browser error | `Stopped(NavigationFailed)` |
//!
//! Whatever is still pending when the machine stops is flushed once more.

use crate::browser::Navigator;
use crate::dates::parse_abbreviated_date;
use crate::error::{NavigationError, SinkError};
use crate::images::ImageFetcher;
use crate::models::{NewsItem, SearchCriteria};
use crate::outputs::excel::ResultSink;
use crate::scrapers::page::{PageOutcome, PageScraper};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{info, instrument, warn};

pub const NEXT_PAGE_SELECTOR: &str = "div.search-results-module-next-page a";

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The newest result on the first page is already too old.
    NothingInRange,
    /// A page contained a result older than the cutoff.
    CutoffReached,
    NoNextPage,
    NavigationFailed,
    ExtractionFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeState {
    Scraping,
    Flushing,
    Paginating,
    Stopped(StopReason),
}

/// Mutable bookkeeping for one run.
#[derive(Debug)]
pub struct ScrapeSession {
    pub page_number: u32,
    /// Items waiting for the next flush.
    pub pending: Vec<NewsItem>,
    pub total_flushed: usize,
    pub should_continue: bool,
    /// Items of the current page not yet moved to `pending`.
    unconsumed: VecDeque<NewsItem>,
    page_loaded: bool,
}

impl ScrapeSession {
    pub fn new() -> Self {
        Self {
            page_number: 1,
            pending: Vec::new(),
            total_flushed: 0,
            should_continue: true,
            unconsumed: VecDeque::new(),
            page_loaded: false,
        }
    }

    fn load(&mut self, outcome: PageOutcome) {
        self.unconsumed = outcome.items.into();
        self.should_continue = outcome.should_continue;
        self.page_loaded = true;
    }
}

impl Default for ScrapeSession {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub pages: u32,
    pub persisted: usize,
    pub stop_reason: StopReason,
}

#[derive(Debug, Clone, Copy)]
pub struct PaginationSettings {
    /// Pending items that trigger a flush.
    pub flush_threshold: usize,
    /// Pause after clicking the next page link.
    pub page_settle: Duration,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            flush_threshold: 10,
            page_settle: Duration::from_secs(5),
        }
    }
}

/// Drives a [`PageScraper`] across result pages into a [`ResultSink`].
pub struct PaginationController<'a, N, F, S> {
    navigator: &'a N,
    scraper: PageScraper<'a, N, F>,
    sink: &'a mut S,
    settings: PaginationSettings,
}

impl<'a, N, F, S> PaginationController<'a, N, F, S>
where
    N: Navigator,
    F: ImageFetcher,
    S: ResultSink,
{
    pub fn new(
        navigator: &'a N,
        scraper: PageScraper<'a, N, F>,
        sink: &'a mut S,
        settings: PaginationSettings,
    ) -> Self {
        Self {
            navigator,
            scraper,
            sink,
            settings: PaginationSettings {
                flush_threshold: settings.flush_threshold.max(1),
                ..settings
            },
        }
    }

    /// Scrape from the current page until a stop condition, persisting as it goes.
    ///
    /// Only a failing sink makes the run fail; browser trouble ends it early.
    #[instrument(level = "info", skip_all, fields(phrase = %criteria.phrase, cutoff = %criteria.cutoff))]
    pub async fn run(&mut self, criteria: &SearchCriteria) -> Result<RunSummary, SinkError> {
        let mut session = ScrapeSession::new();
        let mut state = ScrapeState::Scraping;

        let stop_reason = loop {
            state = match state {
                ScrapeState::Scraping => self.scrape(&mut session, criteria).await,
                ScrapeState::Flushing => {
                    self.flush(&mut session)?;
                    ScrapeState::Scraping
                }
                ScrapeState::Paginating => self.paginate(&mut session).await,
                ScrapeState::Stopped(reason) => break reason,
            };
        };

        if !session.pending.is_empty() {
            self.flush(&mut session)?;
        }

        let summary = RunSummary {
            pages: session.page_number,
            persisted: session.total_flushed,
            stop_reason,
        };
        info!(pages = summary.pages, persisted = summary.persisted, reason = ?summary.stop_reason, "Scrape finished");
        Ok(summary)
    }

    async fn scrape(&self, session: &mut ScrapeSession, criteria: &SearchCriteria) -> ScrapeState {
        if !session.page_loaded {
            info!(page = session.page_number, "Scraping page");
            let outcome = match self.scraper.scrape_page(criteria).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(page = session.page_number, error = %e, "Failed to read results page");
                    return ScrapeState::Stopped(StopReason::ExtractionFailed);
                }
            };
            if session.page_number == 1 && first_result_precedes_cutoff(&outcome.items, criteria) {
                warn!("No news items found within the specified period");
                return ScrapeState::Stopped(StopReason::NothingInRange);
            }
            session.load(outcome);
        }

        while let Some(item) = session.unconsumed.pop_front() {
            session.pending.push(item);
            if session.pending.len() >= self.settings.flush_threshold {
                return ScrapeState::Flushing;
            }
        }

        if session.should_continue {
            ScrapeState::Paginating
        } else {
            ScrapeState::Stopped(StopReason::CutoffReached)
        }
    }

    fn flush(&mut self, session: &mut ScrapeSession) -> Result<(), SinkError> {
        self.sink.append_rows(&session.pending)?;
        session.total_flushed += session.pending.len();
        info!(rows = session.pending.len(), total = session.total_flushed, "Flushed results");
        session.pending.clear();
        Ok(())
    }

    async fn paginate(&self, session: &mut ScrapeSession) -> ScrapeState {
        match self.next_page().await {
            Ok(true) => {
                session.page_number += 1;
                session.page_loaded = false;
                ScrapeState::Scraping
            }
            Ok(false) => {
                info!(page = session.page_number, "No more pages found");
                ScrapeState::Stopped(StopReason::NoNextPage)
            }
            Err(e) => {
                warn!(page = session.page_number, error = %e, "Failed to navigate to the next page");
                ScrapeState::Stopped(StopReason::NavigationFailed)
            }
        }
    }

    /// Follow the next page link; `Ok(false)` when there is none.
    async fn next_page(&self) -> Result<bool, NavigationError> {
        if !self.navigator.exists(NEXT_PAGE_SELECTOR).await? {
            return Ok(false);
        }
        self.navigator.click(NEXT_PAGE_SELECTOR).await?;
        if !self.settings.page_settle.is_zero() {
            tokio::time::sleep(self.settings.page_settle).await;
        }
        self.navigator.wait_for_load_state().await?;
        Ok(true)
    }
}

/// The first-page range check, using the abbreviated-month rule.
///
/// A date that rule cannot read is logged and treated as in range.
fn first_result_precedes_cutoff(items: &[NewsItem], criteria: &SearchCriteria) -> bool {
    let Some(first) = items.first() else {
        return false;
    };
    match parse_abbreviated_date(&first.published_raw) {
        Ok(at) => criteria.precedes_cutoff(at),
        Err(e) => {
            warn!(date = %first.published_raw, error = %e, "Cannot check first result against the period");
            false
        }
    }
}
