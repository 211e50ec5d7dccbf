//! In-memory collaborators for the scraper tests.

use crate::browser::Navigator;
use crate::error::{FetchError, NavigationError, SinkError};
use crate::images::ImageFetcher;
use crate::models::NewsItem;
use crate::outputs::excel::ResultSink;
use crate::scrapers::pagination::NEXT_PAGE_SELECTOR;
use scraper::{Html, Selector};
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

pub const BASE_URL: &str = "https://www.latimes.com/";

/// Shared, ordered record of what the doubles were asked to do.
pub type EventLog = Rc<RefCell<Vec<String>>>;

/// One `<li><ps-promo>` search result.
pub fn promo(
    title: &str,
    date: Option<&str>,
    description: Option<&str>,
    image: Option<&str>,
) -> String {
    let mut html = format!(r#"<li><ps-promo><h3 class="promo-title"><a href="/story">{title}</a></h3>"#);
    if let Some(date) = date {
        html.push_str(&format!(r#"<p class="promo-timestamp">{date}</p>"#));
    }
    if let Some(description) = description {
        html.push_str(&format!(r#"<p class="promo-description">{description}</p>"#));
    }
    if let Some(image) = image {
        html.push_str(&format!(r#"<img src="{image}">"#));
    }
    html.push_str("</ps-promo></li>");
    html
}

/// A results page holding `promos`, with a next page link when `has_next`.
pub fn results_page(promos: &[String], has_next: bool) -> String {
    let next = if has_next {
        r#"<div class="search-results-module-next-page"><a href="?p=next">Next</a></div>"#
    } else {
        ""
    };
    format!(
        "<html><body><ul class=\"search-results-module-results-menu\">{}</ul>{next}</body></html>",
        promos.concat()
    )
}

/// A browser whose pages are fixed HTML strings.
///
/// Clicking the next page link advances to the following page.
pub struct StubSite {
    pages: Vec<String>,
    current: Cell<usize>,
    log: EventLog,
    missing: Vec<String>,
    fail_content: bool,
}

impl StubSite {
    pub fn new(pages: Vec<String>, log: EventLog) -> Self {
        Self {
            pages,
            current: Cell::new(0),
            log,
            missing: Vec::new(),
            fail_content: false,
        }
    }

    /// Make every interaction with `selector` fail as if it were absent.
    pub fn without(mut self, selector: &str) -> Self {
        self.missing.push(selector.to_string());
        self
    }

    pub fn failing_content(mut self) -> Self {
        self.fail_content = true;
        self
    }

    pub fn current_page(&self) -> usize {
        self.current.get() + 1
    }

    fn record(&self, event: String) {
        self.log.borrow_mut().push(event);
    }

    fn present(&self, selector: &str) -> Result<(), NavigationError> {
        if self.missing.iter().any(|m| m == selector) {
            Err(NavigationError::ElementNotFound(selector.to_string()))
        } else {
            Ok(())
        }
    }

    fn page_matches(&self, selector: &str) -> bool {
        let Ok(parsed) = Selector::parse(selector) else {
            return false;
        };
        let html = Html::parse_document(&self.pages[self.current.get()]);
        html.select(&parsed).next().is_some()
    }
}

impl Navigator for StubSite {
    async fn goto(&self, url: &str, _timeout: Duration) -> Result<(), NavigationError> {
        self.record(format!("goto {url}"));
        self.present(url)
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), NavigationError> {
        self.record(format!("wait {selector}"));
        self.present(selector).map_err(|_| NavigationError::Timeout {
            selector: selector.to_string(),
            timeout,
        })
    }

    async fn click(&self, selector: &str) -> Result<(), NavigationError> {
        self.record(format!("click {selector}"));
        self.present(selector)?;
        if selector == NEXT_PAGE_SELECTOR {
            if !self.page_matches(selector) || self.current.get() + 1 >= self.pages.len() {
                return Err(NavigationError::ElementNotFound(selector.to_string()));
            }
            self.current.set(self.current.get() + 1);
        }
        Ok(())
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<(), NavigationError> {
        self.record(format!("fill {selector} {text}"));
        self.present(selector)
    }

    async fn select_option(&self, selector: &str, value: &str) -> Result<(), NavigationError> {
        self.record(format!("select {selector} {value}"));
        self.present(selector)
    }

    async fn check(&self, selector: &str) -> Result<(), NavigationError> {
        self.record(format!("check {selector}"));
        self.present(selector)
    }

    async fn wait_for_load_state(&self) -> Result<(), NavigationError> {
        self.record("load".to_string());
        Ok(())
    }

    async fn exists(&self, selector: &str) -> Result<bool, NavigationError> {
        self.record(format!("exists {selector}"));
        Ok(self.present(selector).is_ok() && self.page_matches(selector))
    }

    async fn content(&self) -> Result<String, NavigationError> {
        self.record(format!("content {}", self.current_page()));
        if self.fail_content {
            return Err(NavigationError::Other("renderer crashed".to_string()));
        }
        Ok(self.pages[self.current.get()].clone())
    }
}

/// Remembers requested downloads without touching the network or disk.
#[derive(Default)]
pub struct RecordingFetcher {
    downloads: RefCell<Vec<(String, PathBuf)>>,
    fail: bool,
}

impl RecordingFetcher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn downloads(&self) -> Vec<(String, PathBuf)> {
        self.downloads.borrow().clone()
    }
}

impl ImageFetcher for RecordingFetcher {
    async fn download(&self, url: &str, destination: &Path) -> Result<(), FetchError> {
        self.downloads
            .borrow_mut()
            .push((url.to_string(), destination.to_path_buf()));
        if self.fail {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }
        Ok(())
    }
}

/// Keeps every flushed batch in memory.
pub struct RecordingSink {
    pub batches: Vec<Vec<NewsItem>>,
    log: EventLog,
}

impl RecordingSink {
    pub fn new(log: EventLog) -> Self {
        Self {
            batches: Vec::new(),
            log,
        }
    }

    pub fn rows(&self) -> Vec<NewsItem> {
        self.batches.concat()
    }
}

impl ResultSink for RecordingSink {
    fn append_rows(&mut self, items: &[NewsItem]) -> Result<(), SinkError> {
        self.log.borrow_mut().push(format!("flush {}", items.len()));
        self.batches.push(items.to_vec());
        Ok(())
    }
}
