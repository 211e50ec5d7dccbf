//! [`Navigator`] over a Chromium page driven by chromiumoxide.
//!
//! The browser event handler runs on its own task for as long as the
//! navigator lives and is aborted on drop.

use super::{Navigator, SelectorKind};
use crate::error::NavigationError;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Launch options for [`ChromeNavigator`].
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    /// Pause after every interaction.
    pub slow_mo: Duration,
    /// Timeout for a single DevTools request.
    pub request_timeout: Duration,
    /// Upper bound for waiting on a page load.
    pub load_timeout: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            slow_mo: Duration::from_millis(100),
            request_timeout: Duration::from_secs(30),
            load_timeout: Duration::from_secs(60),
        }
    }
}

/// A single Chromium tab.
pub struct ChromeNavigator {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    slow_mo: Duration,
    load_timeout: Duration,
}

impl ChromeNavigator {
    /// Start Chromium and open a blank tab.
    #[instrument(level = "info", skip_all, fields(headless = options.headless))]
    pub async fn launch(options: &BrowserOptions) -> Result<Self, NavigationError> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(options.request_timeout)
            .window_size(1920, 1080);
        if !options.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(NavigationError::Other)?;

        let (browser, mut handler) = Browser::launch(config).await?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    error!(error = ?e, "Browser handler error");
                }
            }
            debug!("Browser event handler finished");
        });

        let page = browser.new_page("about:blank").await?;
        info!("Browser launched");
        Ok(Self {
            browser,
            page,
            handler,
            slow_mo: options.slow_mo,
            load_timeout: options.load_timeout,
        })
    }

    /// Close the browser and wait for the process to exit.
    pub async fn shutdown(&mut self) {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "Failed to close browser");
        }
        if let Err(e) = self.browser.wait().await {
            warn!(error = %e, "Failed waiting for browser exit");
        }
        self.handler.abort();
    }

    async fn find(&self, selector: &str) -> Result<Element, NavigationError> {
        let found = match SelectorKind::parse(selector) {
            SelectorKind::Css(css) => self.page.find_element(css).await,
            SelectorKind::XPath(xpath) => self.page.find_xpath(xpath).await,
        };
        found.map_err(|e| {
            debug!(selector, error = %e, "Element lookup failed");
            NavigationError::ElementNotFound(selector.to_string())
        })
    }

    async fn pause(&self) {
        if !self.slow_mo.is_zero() {
            tokio::time::sleep(self.slow_mo).await;
        }
    }
}

/// Run a DevTools call, giving up after `timeout`. `target` names what was
/// awaited in the timeout error.
async fn within<T>(
    timeout: Duration,
    target: &str,
    call: impl Future<Output = Result<T, CdpError>>,
) -> Result<T, NavigationError> {
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| NavigationError::Timeout {
            selector: target.to_string(),
            timeout,
        })?
        .map_err(NavigationError::from)
}

impl Drop for ChromeNavigator {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

impl Navigator for ChromeNavigator {
    #[instrument(level = "info", skip(self))]
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), NavigationError> {
        within(timeout, url, self.page.goto(url)).await?;
        self.pause().await;
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), NavigationError> {
        let start = Instant::now();
        loop {
            if self.find(selector).await.is_ok() {
                debug!(elapsed = ?start.elapsed(), "Selector appeared");
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(NavigationError::Timeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    #[instrument(level = "debug", skip(self))]
    async fn click(&self, selector: &str) -> Result<(), NavigationError> {
        self.find(selector).await?.click().await?;
        self.pause().await;
        Ok(())
    }

    #[instrument(level = "debug", skip(self, text))]
    async fn fill(&self, selector: &str, text: &str) -> Result<(), NavigationError> {
        let element = self.find(selector).await?;
        element
            .call_js_fn("function() { this.value = ''; }", false)
            .await?;
        element.click().await?.type_str(text).await?;
        self.pause().await;
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    async fn select_option(&self, selector: &str, value: &str) -> Result<(), NavigationError> {
        let value = serde_json::to_string(value).map_err(|e| NavigationError::Other(e.to_string()))?;
        let script = format!(
            "function() {{ this.value = {value}; \
             this.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             this.dispatchEvent(new Event('change', {{ bubbles: true }})); }}"
        );
        self.find(selector).await?.call_js_fn(script, false).await?;
        self.pause().await;
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    async fn check(&self, selector: &str) -> Result<(), NavigationError> {
        self.find(selector)
            .await?
            .call_js_fn("function() { if (!this.checked) { this.click(); } }", false)
            .await?;
        self.pause().await;
        Ok(())
    }

    async fn wait_for_load_state(&self) -> Result<(), NavigationError> {
        within(self.load_timeout, "page load", self.page.wait_for_navigation()).await?;
        Ok(())
    }

    async fn exists(&self, selector: &str) -> Result<bool, NavigationError> {
        Ok(self.find(selector).await.is_ok())
    }

    async fn content(&self) -> Result<String, NavigationError> {
        Ok(self.page.content().await?)
    }
}
