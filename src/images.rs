//! Article image download and naming.
//!
//! Each search result's thumbnail is saved under the output directory with a
//! name derived from the article title. Downloads are sequential and a file
//! with the same name is overwritten.

use crate::error::FetchError;
use crate::utils::sanitize_filename;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const DEFAULT_EXTENSION: &str = ".jpg";
const KNOWN_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".bmp"];

/// Length limits for generated image filenames.
#[derive(Debug, Clone, Copy)]
pub struct FilenameLimits {
    /// Characters kept from the sanitized title.
    pub stem_chars: usize,
    /// Upper bound for stem plus extension.
    pub total_chars: usize,
}

impl Default for FilenameLimits {
    fn default() -> Self {
        Self {
            stem_chars: 30,
            total_chars: 50,
        }
    }
}

/// Something that can store the bytes behind an image URL at a path.
pub trait ImageFetcher {
    /// Download `url` to `destination`, replacing any existing file.
    async fn download(&self, url: &str, destination: &Path) -> Result<(), FetchError>;
}

/// [`ImageFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl ImageFetcher for HttpImageFetcher {
    #[instrument(level = "debug", skip(self), fields(dest = %destination.display()))]
    async fn download(&self, url: &str, destination: &Path) -> Result<(), FetchError> {
        let bytes = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        tokio::fs::write(destination, &bytes)
            .await
            .map_err(|source| FetchError::Io {
                path: destination.to_path_buf(),
                source,
            })?;
        debug!(bytes = bytes.len(), "Saved image");
        Ok(())
    }
}

/// Resolve an `img` `src` attribute against the page it appeared on.
pub fn resolve_image_url(base: &Url, src: &str) -> Result<Url, FetchError> {
    base.join(src.trim())
        .map_err(|_| FetchError::InvalidUrl(src.to_string()))
}

/// Extension of the last path segment when it is a known image type,
/// otherwise `.jpg`. The original case is kept.
pub fn image_extension(url: &Url) -> &str {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();
    match segment.rfind('.') {
        Some(dot) if dot > 0 => {
            let ext = &segment[dot..];
            if KNOWN_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
            {
                ext
            } else {
                DEFAULT_EXTENSION
            }
        }
        _ => DEFAULT_EXTENSION,
    }
}

/// Filename for the image of an article titled `title`.
///
/// The stem is the sanitized title, cut so that stem and extension together
/// never exceed [`FilenameLimits::total_chars`].
pub fn image_filename(title: &str, url: &Url, limits: FilenameLimits) -> String {
    let ext = image_extension(url);
    let room = limits.total_chars.saturating_sub(ext.len());
    let stem = sanitize_filename(title, limits.stem_chars.min(room));
    format!("{stem}{ext}")
}
