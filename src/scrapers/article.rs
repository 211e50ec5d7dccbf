//! Extraction of a single search result.
//!
//! Extraction happens in two steps. [`ArticleFields::read`] copies the text
//! out of the parsed DOM synchronously, so no `scraper` node is held across
//! an await. [`ArticleExtractor::extract`] then applies sentinels, downloads
//! the image and computes the derived metrics.

use crate::dates::parse_published_date;
use crate::images::{image_filename, resolve_image_url, FilenameLimits, ImageFetcher};
use crate::models::{NewsItem, NO_DESCRIPTION, NO_IMAGE, NO_TITLE};
use crate::utils::{contains_money, count_phrase};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use std::path::Path;
use tracing::{debug, warn};
use url::Url;

static TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h3.promo-title > a").expect("static selector"));
static TIMESTAMP: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p.promo-timestamp").expect("static selector"));
static DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p.promo-description").expect("static selector"));
static IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("img").expect("static selector"));

/// Raw text of one result, `None` where the element is absent or empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleFields {
    pub title: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub image_src: Option<String>,
}

/// The date of a result after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleDate {
    Parsed { raw: String, at: NaiveDateTime },
    Unparsed { raw: String },
    Missing,
}

impl ArticleFields {
    /// Copy the first match of each field selector out of `article`.
    pub fn read(article: ElementRef<'_>) -> Self {
        Self {
            title: first_text(article, &TITLE),
            date: first_text(article, &TIMESTAMP),
            description: first_text(article, &DESCRIPTION),
            image_src: article
                .select(&IMAGE)
                .next()
                .and_then(|img| img.value().attr("src"))
                .map(str::trim)
                .filter(|src| !src.is_empty())
                .map(str::to_string),
        }
    }

    pub fn date(&self) -> ArticleDate {
        match &self.date {
            None => ArticleDate::Missing,
            Some(raw) => match parse_published_date(raw) {
                Ok(at) => ArticleDate::Parsed {
                    raw: raw.clone(),
                    at,
                },
                Err(_) => ArticleDate::Unparsed { raw: raw.clone() },
            },
        }
    }
}

/// Whitespace-collapsed text of the first element matching `selector`.
fn first_text(article: ElementRef<'_>, selector: &Selector) -> Option<String> {
    article
        .select(selector)
        .next()
        .map(|el| el.text().collect::<Vec<_>>().join(" "))
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|text| !text.is_empty())
}

/// Date text and timestamp that end up on a [`NewsItem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub raw: String,
    pub at: Option<NaiveDateTime>,
}

/// Turns [`ArticleFields`] into finished [`NewsItem`]s.
pub struct ArticleExtractor<'a, F> {
    fetcher: &'a F,
    image_dir: &'a Path,
    base_url: &'a Url,
    limits: FilenameLimits,
}

impl<'a, F: ImageFetcher> ArticleExtractor<'a, F> {
    pub fn new(fetcher: &'a F, image_dir: &'a Path, base_url: &'a Url, limits: FilenameLimits) -> Self {
        Self {
            fetcher,
            image_dir,
            base_url,
            limits,
        }
    }

    /// Build the item for one result. `phrase` is matched case-insensitively.
    pub async fn extract(&self, fields: ArticleFields, published: Published, phrase: &str) -> NewsItem {
        let title = fields.title.unwrap_or_else(|| NO_TITLE.to_string());
        let description = fields
            .description
            .unwrap_or_else(|| NO_DESCRIPTION.to_string());
        let image_filename = self.download_image(&title, fields.image_src.as_deref()).await;

        let phrase_count = count_phrase(phrase, &title, &description);
        let contains_money = contains_money(&title, &description);
        debug!(%title, phrase_count, contains_money, "Extracted article");

        NewsItem {
            title,
            published_raw: published.raw,
            published_at: published.at,
            description,
            image_filename,
            phrase_count,
            contains_money,
        }
    }

    /// Download the result image, returning the stored filename or
    /// [`NO_IMAGE`] when there is no image or the download fails.
    async fn download_image(&self, title: &str, src: Option<&str>) -> String {
        let Some(src) = src else {
            return NO_IMAGE.to_string();
        };
        let url = match resolve_image_url(self.base_url, src) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "Skipping image");
                return NO_IMAGE.to_string();
            }
        };

        let filename = image_filename(title, &url, self.limits);
        let destination = self.image_dir.join(&filename);
        match self.fetcher.download(url.as_str(), &destination).await {
            Ok(()) => filename,
            Err(e) => {
                warn!(%url, error = %e, "Image download failed");
                NO_IMAGE.to_string()
            }
        }
    }
}
