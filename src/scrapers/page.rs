//! Scraping of one rendered results page.

use crate::browser::Navigator;
use crate::error::NavigationError;
use crate::images::ImageFetcher;
use crate::models::{MissingDatePolicy, NewsItem, SearchCriteria, NO_DATE};
use crate::scrapers::article::{ArticleDate, ArticleExtractor, ArticleFields, Published};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};

static ARTICLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("li > ps-promo").expect("static selector"));

/// Items scraped from one page and whether the next page is still wanted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOutcome {
    pub items: Vec<NewsItem>,
    /// False once any item on the page predates the cutoff.
    pub should_continue: bool,
}

/// Every search result in `html`, in document order.
pub fn read_articles(html: &str) -> Vec<ArticleFields> {
    let document = Html::parse_document(html);
    document.select(&ARTICLE).map(ArticleFields::read).collect()
}

/// Date to record for a result, or `None` when the result is dropped.
fn published_for(date: ArticleDate, policy: MissingDatePolicy) -> Option<Published> {
    match (date, policy) {
        (ArticleDate::Parsed { raw, at }, _) => Some(Published { raw, at: Some(at) }),
        (ArticleDate::Unparsed { raw }, MissingDatePolicy::Sentinel) => {
            Some(Published { raw, at: None })
        }
        (ArticleDate::Missing, MissingDatePolicy::Sentinel) => Some(Published {
            raw: NO_DATE.to_string(),
            at: None,
        }),
        (_, MissingDatePolicy::Skip) => None,
    }
}

/// Scrapes whatever results page the navigator currently shows.
pub struct PageScraper<'a, N, F> {
    navigator: &'a N,
    extractor: ArticleExtractor<'a, F>,
    policy: MissingDatePolicy,
}

impl<'a, N: Navigator, F: ImageFetcher> PageScraper<'a, N, F> {
    pub fn new(navigator: &'a N, extractor: ArticleExtractor<'a, F>, policy: MissingDatePolicy) -> Self {
        Self {
            navigator,
            extractor,
            policy,
        }
    }

    /// Extract every result on the current page.
    ///
    /// A result dated before the cutoff clears `should_continue` but the
    /// rest of the page is still extracted; the caller stops after this page.
    #[instrument(level = "info", skip_all)]
    pub async fn scrape_page(&self, criteria: &SearchCriteria) -> Result<PageOutcome, NavigationError> {
        let html = self.navigator.content().await?;
        let articles = read_articles(&html);
        info!(count = articles.len(), "Found results on page");

        let mut outcome = PageOutcome {
            items: Vec::with_capacity(articles.len()),
            should_continue: true,
        };
        for (index, fields) in articles.into_iter().enumerate() {
            let Some(published) = published_for(fields.date(), self.policy) else {
                debug!(index, date = ?fields.date, "Skipping result without a usable date");
                continue;
            };
            if let Some(at) = published.at
                && criteria.precedes_cutoff(at)
            {
                if outcome.should_continue {
                    info!(index, date = %published.raw, cutoff = %criteria.cutoff, "Reached results older than the period");
                }
                outcome.should_continue = false;
            }

            let item = self
                .extractor
                .extract(fields, published, &criteria.phrase_folded)
                .await;
            outcome.items.push(item);
        }
        Ok(outcome)
    }
}
