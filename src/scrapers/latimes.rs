//! Browser flows that bring the Los Angeles Times site to a sorted,
//! filtered results page.

use crate::browser::Navigator;
use crate::error::NavigationError;
use std::time::Duration;
use tracing::{info, instrument, warn};
use url::Url;

pub const SEARCH_BUTTON: &str = "xpath=//button[@data-element='search-button']";
pub const SEARCH_INPUT: &str = "xpath=//input[@data-element='search-form-input']";
pub const SEARCH_SUBMIT: &str = "xpath=//button[@data-element='search-submit-button']";
pub const SORT_SELECT: &str = "select[name='s']";
/// `<option>` value of the "Newest" sort order.
pub const SORT_NEWEST: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteTimeouts {
    pub page_load: Duration,
    pub selector: Duration,
    /// Pause after ticking a category so the results refresh.
    pub filter_settle: Duration,
}

impl Default for SiteTimeouts {
    fn default() -> Self {
        Self {
            page_load: Duration::from_secs(60),
            selector: Duration::from_secs(20),
            filter_settle: Duration::from_secs(10),
        }
    }
}

/// XPath matching the checkbox labelled `category` in the filter sidebar.
pub fn category_checkbox(category: &str) -> String {
    format!(
        "xpath=//span[text()={}]/preceding::input[@type='checkbox'][1]",
        xpath_literal(category)
    )
}

/// Quote `text` as an XPath 1.0 string literal.
fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        return format!("'{text}'");
    }
    if !text.contains('"') {
        return format!("\"{text}\"");
    }
    let parts: Vec<String> = text.split('\'').map(|part| format!("'{part}'")).collect();
    format!("concat({})", parts.join(", \"'\", "))
}

/// The site as seen through one browser page.
pub struct LaTimesSite<'a, N> {
    navigator: &'a N,
    base_url: &'a Url,
    timeouts: SiteTimeouts,
}

impl<'a, N: Navigator> LaTimesSite<'a, N> {
    pub fn new(navigator: &'a N, base_url: &'a Url, timeouts: SiteTimeouts) -> Self {
        Self {
            navigator,
            base_url,
            timeouts,
        }
    }

    /// Load the home page and wait until the search button is usable.
    #[instrument(level = "info", skip(self), fields(url = %self.base_url))]
    pub async fn open_news_website(&self) -> Result<(), NavigationError> {
        self.navigator
            .goto(self.base_url.as_str(), self.timeouts.page_load)
            .await?;
        self.navigator
            .wait_for_selector(SEARCH_BUTTON, self.timeouts.selector)
            .await?;
        info!("Search button is loaded");
        Ok(())
    }

    /// Open the search form, submit `phrase` and wait for the results.
    #[instrument(level = "info", skip(self))]
    pub async fn input_search_phrase(&self, phrase: &str) -> Result<(), NavigationError> {
        self.navigator.click(SEARCH_BUTTON).await?;
        self.navigator.fill(SEARCH_INPUT, phrase).await?;
        self.navigator.click(SEARCH_SUBMIT).await?;
        self.navigator.wait_for_load_state().await
    }

    /// Sort by newest and, when given, restrict to `category`.
    ///
    /// Never fails: a filter that cannot be applied is logged and the
    /// results are scraped with whatever filters did apply.
    #[instrument(level = "info", skip(self))]
    pub async fn apply_filters(&self, category: Option<&str>) {
        if let Err(e) = self.navigator.select_option(SORT_SELECT, SORT_NEWEST).await {
            warn!(error = %e, "Could not sort results by newest");
            return;
        }

        let Some(category) = category else {
            info!("No category specified, only sorting by newest");
            return;
        };
        match self.select_category(category).await {
            Ok(()) => info!(category, "Category selected"),
            Err(e) => warn!(category, error = %e, "Category could not be found or selected"),
        }
    }

    async fn select_category(&self, category: &str) -> Result<(), NavigationError> {
        self.navigator.wait_for_load_state().await?;
        self.navigator.check(&category_checkbox(category)).await?;
        if !self.timeouts.filter_settle.is_zero() {
            tokio::time::sleep(self.timeouts.filter_settle).await;
        }
        self.navigator.wait_for_load_state().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::testing::{EventLog, StubSite, BASE_URL};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn timeouts() -> SiteTimeouts {
        SiteTimeouts {
            filter_settle: Duration::ZERO,
            ..Default::default()
        }
    }

    fn stub(configure: impl FnOnce(StubSite) -> StubSite) -> (StubSite, EventLog) {
        let log: EventLog = Rc::new(RefCell::new(Vec::new()));
        (configure(StubSite::new(vec![String::new()], log.clone())), log)
    }

    #[test]
    fn test_xpath_literal() {
        assert_eq!(xpath_literal("Business"), "'Business'");
        assert_eq!(xpath_literal("Kids' Health"), "\"Kids' Health\"");
        assert_eq!(
            xpath_literal("Say \"it's\""),
            "concat('Say \"it', \"'\", 's\"')"
        );
    }

    #[test]
    fn test_category_checkbox() {
        assert_eq!(
            category_checkbox("California"),
            "xpath=//span[text()='California']/preceding::input[@type='checkbox'][1]"
        );
    }

    #[tokio::test]
    async fn test_open_news_website() {
        let (site, log) = stub(|s| s);
        let base = Url::parse(BASE_URL).unwrap();
        LaTimesSite::new(&site, &base, timeouts())
            .open_news_website()
            .await
            .unwrap();
        assert_eq!(
            *log.borrow(),
            [format!("goto {BASE_URL}"), format!("wait {SEARCH_BUTTON}")]
        );
    }

    #[tokio::test]
    async fn test_open_news_website_times_out() {
        let (site, _log) = stub(|s| s.without(SEARCH_BUTTON));
        let base = Url::parse(BASE_URL).unwrap();
        let err = LaTimesSite::new(&site, &base, timeouts())
            .open_news_website()
            .await
            .unwrap_err();
        assert!(matches!(err, NavigationError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_input_search_phrase() {
        let (site, log) = stub(|s| s);
        let base = Url::parse(BASE_URL).unwrap();
        LaTimesSite::new(&site, &base, timeouts())
            .input_search_phrase("climate change")
            .await
            .unwrap();
        assert_eq!(
            *log.borrow(),
            [
                format!("click {SEARCH_BUTTON}"),
                format!("fill {SEARCH_INPUT} climate change"),
                format!("click {SEARCH_SUBMIT}"),
                "load".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_apply_filters_with_category() {
        let (site, log) = stub(|s| s);
        let base = Url::parse(BASE_URL).unwrap();
        LaTimesSite::new(&site, &base, timeouts())
            .apply_filters(Some("Business"))
            .await;
        assert_eq!(
            *log.borrow(),
            [
                format!("select {SORT_SELECT} {SORT_NEWEST}"),
                "load".to_string(),
                format!("check {}", category_checkbox("Business")),
                "load".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_apply_filters_without_category() {
        let (site, log) = stub(|s| s);
        let base = Url::parse(BASE_URL).unwrap();
        LaTimesSite::new(&site, &base, timeouts())
            .apply_filters(None)
            .await;
        assert_eq!(*log.borrow(), [format!("select {SORT_SELECT} {SORT_NEWEST}")]);
    }

    #[tokio::test]
    async fn test_missing_category_is_tolerated() {
        let checkbox = category_checkbox("Nonexistent");
        let (site, log) = stub(|s| s.without(&checkbox));
        let base = Url::parse(BASE_URL).unwrap();
        LaTimesSite::new(&site, &base, timeouts())
            .apply_filters(Some("Nonexistent"))
            .await;
        // No second load wait once the checkbox is missing.
        assert_eq!(log.borrow().last(), Some(&format!("check {checkbox}")));
    }
}
