//! Browser page control.
//!
//! The scraper never touches the browser directly; every component receives
//! a [`Navigator`] reference when it is constructed. [`chrome::ChromeNavigator`]
//! drives a real Chromium page, while the unit tests substitute static HTML.
//!
//! # Selectors
//!
//! Selectors are CSS by default. A selector prefixed with `xpath=` is an
//! XPath expression, matching the way the site flows address elements that
//! have no stable CSS hook.

pub mod chrome;

use crate::error::NavigationError;
use std::time::Duration;

const XPATH_PREFIX: &str = "xpath=";

/// A parsed selector string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind<'a> {
    Css(&'a str),
    XPath(&'a str),
}

impl<'a> SelectorKind<'a> {
    pub fn parse(selector: &'a str) -> Self {
        match selector.strip_prefix(XPATH_PREFIX) {
            Some(xpath) => SelectorKind::XPath(xpath),
            None => SelectorKind::Css(selector),
        }
    }
}

/// Operations the scraper needs from a browser page.
///
/// Methods take `&self`; the page is owned by the implementor and only one
/// component drives it at a time.
pub trait Navigator {
    /// Load `url`, failing after `timeout`.
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), NavigationError>;

    /// Wait until `selector` matches an element.
    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), NavigationError>;

    async fn click(&self, selector: &str) -> Result<(), NavigationError>;

    /// Replace the value of an input with `text`.
    async fn fill(&self, selector: &str, text: &str) -> Result<(), NavigationError>;

    /// Pick the `<option>` whose value is `value`.
    async fn select_option(&self, selector: &str, value: &str) -> Result<(), NavigationError>;

    /// Tick a checkbox; no-op when already ticked.
    async fn check(&self, selector: &str) -> Result<(), NavigationError>;

    /// Wait for the pending navigation, if any, to finish loading.
    async fn wait_for_load_state(&self) -> Result<(), NavigationError>;

    /// Whether `selector` currently matches an element.
    async fn exists(&self, selector: &str) -> Result<bool, NavigationError>;

    /// Serialized HTML of the rendered page.
    async fn content(&self) -> Result<String, NavigationError>;
}
